//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-store errors (separate crate)                                   │
//! │  └── StoreError       - Data Store failures (transport, permission)    │
//! │                                                                         │
//! │  terminal errors (app)                                                 │
//! │  └── ApiError         - What the UI shows as a notification            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          StoreError ─┴─► ApiError → toast              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation and business errors are raised before any state is mutated,
//! so callers can surface them and carry on with the same cart.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product is not present in the local product index.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    /// Requested quantity exceeds the known stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add "Cola" (stock 3) four times
    ///      │
    ///      ▼
    /// 4th add: available=3, requested=4
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Cola", available: 3, requested: 4 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Cola in stock", quantity stays 3
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Product has no stock left and over-selling is disabled.
    #[error("{product} is out of stock")]
    OutOfStock { product: String },

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Checkout attempted with an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash tendered does not cover the total.
    #[error("Insufficient payment: total {total}, paid {paid}")]
    InsufficientPayment { total: Money, paid: Money },

    /// Operation not allowed in the current checkout state.
    #[error("Cannot {operation} while checkout is {state}")]
    InvalidCheckoutState { state: String, operation: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Cola".to_string(),
            available: 3,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cola: available 3, requested 4"
        );

        let err = CoreError::InsufficientPayment {
            total: Money::from_minor(1050),
            paid: Money::from_minor(1000),
        };
        assert_eq!(err.to_string(), "Insufficient payment: total 10.50, paid 10.00");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::negative("deduction").to_string(),
            "deduction must not be negative"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("barcode").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
