//! # Validation Module
//!
//! Field-level rules applied before any state changes.
//!
//! ## Where Validation Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Browser form                                                          │
//! │  └── Immediate feedback (empty, length)                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  tally-terminal service                                                │
//! │  ├── Deserialization (types)                                           │
//! │  └── THIS MODULE: business rules                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Data Store                                                            │
//! │  └── Path rules only; it trusts what it is given                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed validation never leaves a partial write behind: every caller
//! validates first, then mutates.

use crate::error::ValidationError;
use crate::money::Money;
use crate::totals::DiscountSpec;
use crate::{MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_MINOR};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_BARCODE_LEN: usize = 64;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a field is not blank.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a product name.
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Green Tea 500ml").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required("name", name)?;

    if name.trim().chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a barcode: digits, letters and hyphens, at most 64 characters.
///
/// Uniqueness within a branch is expected but not checked here.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();
    validate_required("barcode", barcode)?;

    if barcode.len() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - At least 1
/// - At most [`MAX_ITEM_QUANTITY`], regardless of stock settings
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 || qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a unit price. Zero is allowed (free items).
///
/// ## Rules
/// - Not negative
/// - At most [`MAX_UNIT_PRICE_MINOR`]
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::negative("price"));
    }
    if price.minor() > MAX_UNIT_PRICE_MINOR {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_MINOR,
        });
    }
    Ok(())
}

/// Validates a tendered amount.
///
/// Zero is accepted here; whether it covers the total is a payment rule,
/// not a field rule.
pub fn validate_payment_amount(paid: Money) -> ValidationResult<()> {
    if paid.is_negative() {
        return Err(ValidationError::negative("paid"));
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates a discount.
///
/// Percentages above 100% are rejected. Fixed amounts may exceed the
/// subtotal; the resulting negative total is left to the caller.
pub fn validate_discount(discount: &DiscountSpec) -> ValidationResult<()> {
    match discount {
        DiscountSpec::None => Ok(()),
        DiscountSpec::Percentage(rate) => {
            if rate.bps() > 10_000 {
                return Err(ValidationError::OutOfRange {
                    field: "discount".to_string(),
                    min: 0,
                    max: 10_000,
                });
            }
            Ok(())
        }
        DiscountSpec::Fixed(amount) => {
            if amount.is_negative() {
                return Err(ValidationError::negative("discount"));
            }
            Ok(())
        }
    }
}

/// Validates a calendar month (1 to 12).
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Percent;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("name", "Ana").is_ok());
        assert!(validate_required("name", "").is_err());
        assert!(validate_required("name", " \t").is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Green Tea").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("5901234123457").is_ok());
        assert!(validate_barcode("ABC-123").is_ok());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode(&"1".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_money_fields() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_minor(-1)).is_err());
        assert!(validate_price(Money::from_minor(MAX_UNIT_PRICE_MINOR)).is_ok());
        assert!(validate_price(Money::from_minor(MAX_UNIT_PRICE_MINOR + 1)).is_err());
        assert!(validate_payment_amount(Money::zero()).is_ok());
        assert!(validate_payment_amount(Money::from_minor(-100)).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&DiscountSpec::None).is_ok());
        assert!(validate_discount(&DiscountSpec::Percentage(Percent::from_bps(1000))).is_ok());
        assert!(validate_discount(&DiscountSpec::Percentage(Percent::from_bps(10_001))).is_err());
        assert!(validate_discount(&DiscountSpec::Fixed(Money::from_major(500))).is_ok());
        assert!(validate_discount(&DiscountSpec::Fixed(Money::from_minor(-1))).is_err());
    }

    #[test]
    fn test_validate_month() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
    }
}
