//! Totals derivation for quotes and invoices.
//!
//! Pure arithmetic over the submitted line items; amounts stay in native
//! floating point with no rounding, matching what the store holds.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::errors::AppError;

/// A single priced line submitted with a quote or invoice payload.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LineItemInput {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    #[serde(default)]
    pub tax_rate: f64,
}

impl LineItemInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.description.is_empty() {
            return Err(AppError::Validation(
                "Item description must not be empty".to_string(),
            ));
        }
        if !(self.quantity > 0.0) {
            return Err(AppError::Validation(
                "Item quantity must be greater than zero".to_string(),
            ));
        }
        if !(self.unit_price >= 0.0) {
            return Err(AppError::Validation(
                "Item unit_price must not be negative".to_string(),
            ));
        }
        if !(self.tax_rate >= 0.0) {
            return Err(AppError::Validation(
                "Item tax_rate must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn validate_items(items: &[LineItemInput]) -> Result<(), AppError> {
    for item in items {
        item.validate()?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

/// `subtotal = Σ(qty·price)`, `tax = Σ(qty·price·rate/100)`, `total = subtotal + tax`.
/// An empty item set yields all zeros.
pub fn compute_totals(items: &[LineItemInput]) -> Totals {
    let subtotal: f64 = items.iter().map(|i| i.quantity * i.unit_price).sum();
    let tax: f64 = items
        .iter()
        .map(|i| i.quantity * i.unit_price * i.tax_rate / 100.0)
        .sum();
    Totals {
        subtotal,
        tax,
        total: subtotal + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: f64, unit_price: f64, tax_rate: f64) -> LineItemInput {
        LineItemInput {
            description: "item".to_string(),
            quantity,
            unit_price,
            tax_rate,
        }
    }

    #[test]
    fn empty_item_set_yields_zero_totals() {
        let totals = compute_totals(&[]);
        assert_eq!(totals.subtotal, 0.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.total, 0.0);
    }

    #[test]
    fn labor_example() {
        // 2 x 100 at 10% tax
        let totals = compute_totals(&[item(2.0, 100.0, 10.0)]);
        assert_eq!(totals.subtotal, 200.0);
        assert_eq!(totals.tax, 20.0);
        assert_eq!(totals.total, 220.0);
    }

    #[test]
    fn total_is_subtotal_plus_tax() {
        let items = [item(3.0, 49.99, 8.25), item(1.5, 80.0, 0.0), item(10.0, 2.35, 21.0)];
        let totals = compute_totals(&items);
        assert_eq!(totals.total, totals.subtotal + totals.tax);

        let expected_tax: f64 = items
            .iter()
            .map(|i| i.quantity * i.unit_price * i.tax_rate / 100.0)
            .sum();
        assert_eq!(totals.tax, expected_tax);
    }

    #[test]
    fn zero_rate_items_contribute_no_tax() {
        let totals = compute_totals(&[item(4.0, 25.0, 0.0)]);
        assert_eq!(totals.subtotal, 100.0);
        assert_eq!(totals.tax, 0.0);
        assert_eq!(totals.total, 100.0);
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert!(item(0.0, 10.0, 0.0).validate().is_err());
        assert!(item(-1.0, 10.0, 0.0).validate().is_err());
        assert!(item(1.0, -0.01, 0.0).validate().is_err());
        assert!(item(1.0, 10.0, -5.0).validate().is_err());
        assert!(item(1.0, 0.0, 0.0).validate().is_ok());

        let mut blank = item(1.0, 10.0, 0.0);
        blank.description = String::new();
        assert!(blank.validate().is_err());
    }
}
