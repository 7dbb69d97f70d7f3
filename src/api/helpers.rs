use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeUtc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

/// Body returned by deletes and sign-up.
#[derive(Serialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(value)
        .map_err(|_| AppError::Validation(format!("{} must be a valid UUID", what)))
}

/// Date fields must be RFC 3339; anything else is a validation failure rather
/// than a best-effort guess.
pub fn parse_datetime(value: &str, field: &str) -> Result<DateTimeUtc, AppError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::Validation(format!("{} must be an RFC 3339 timestamp", field)))
}

pub fn parse_datetime_opt(
    value: Option<&String>,
    field: &str,
) -> Result<Option<DateTimeUtc>, AppError> {
    value.map(|v| parse_datetime(v, field)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_uuid() {
        assert!(parse_uuid("b0c9d9f2-3c68-4f6e-9e1c-0d4a8f1b2c3d", "id").is_ok());
        assert!(parse_uuid("not-a-uuid", "id").is_err());
    }

    #[test]
    fn rejects_non_rfc3339_dates() {
        assert!(parse_datetime("2026-03-20T10:00:00Z", "due_date").is_ok());
        assert!(parse_datetime("2026-03-20T10:00:00+02:00", "due_date").is_ok());
        assert!(parse_datetime("March 20, 2026", "due_date").is_err());
        assert!(parse_datetime_opt(None, "due_date").unwrap().is_none());
    }
}
