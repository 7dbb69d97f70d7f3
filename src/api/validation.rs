//! Payload parsing and field validation for incoming DTOs.
//! Invalid input is rejected before anything reaches the repositories.

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::errors::AppError;

lazy_static::lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
}

/// Deserialize a JSON body into a DTO. Called after the caller's identity is
/// resolved so an unauthenticated request never gets its payload inspected;
/// parse failures (wrong types, unknown fields) become the structured 400.
pub fn parse_payload<T: DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Invalid {} payload: {}", what, e)))
}

/// Deserializer for patch fields where JSON null clears the value and an
/// absent key leaves it untouched. Use with `#[serde(default)]` on an
/// `Option<Option<T>>` field.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

pub fn validate_email_opt(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn ensure_min_len(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

pub fn ensure_max_len(value: &str, max: usize) -> bool {
    value.len() <= max
}

/// Lowercase, collapse runs of non-alphanumerics to `-`, strip leading and
/// trailing dashes; an empty result falls back to "company".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "company".to_string()
    } else {
        slug
    }
}

const SUFFIX_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// 4-character random suffix appended to a slug on collision.
pub fn slug_suffix() -> String {
    (0..4)
        .map(|_| SUFFIX_CHARS[fastrand::usize(..SUFFIX_CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Acme Plumbing & Heating"), "acme-plumbing-heating");
        assert_eq!(slugify("  --Hello__World--  "), "hello-world");
        assert_eq!(slugify("ACME"), "acme");
    }

    #[test]
    fn slugify_empty_falls_back() {
        assert_eq!(slugify(""), "company");
        assert_eq!(slugify("!!!"), "company");
        assert_eq!(slugify("---"), "company");
    }

    #[test]
    fn slug_suffix_shape() {
        for _ in 0..32 {
            let suffix = slug_suffix();
            assert_eq!(suffix.len(), 4);
            assert!(suffix.bytes().all(|b| SUFFIX_CHARS.contains(&b)));
        }
    }

    #[test]
    fn email_validation() {
        assert!(validate_email_opt("owner@example.com"));
        assert!(!validate_email_opt("not-an-email"));
        assert!(!validate_email_opt("missing@tld"));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        #[derive(serde::Deserialize)]
        #[serde(deny_unknown_fields)]
        struct Dto {
            #[allow(dead_code)]
            name: String,
        }

        let ok: Result<Dto, _> = parse_payload(serde_json::json!({"name": "x"}), "test");
        assert!(ok.is_ok());

        let err: Result<Dto, _> =
            parse_payload(serde_json::json!({"name": "x", "extra": 1}), "test");
        assert!(matches!(err, Err(AppError::Validation(_))));
    }
}
