//! # Totals
//!
//! The one place subtotal, tax, discount and total are derived. The live
//! cart summary and the invoice builder both call [`compute_totals`], so
//! the preview and the saved invoice cannot disagree.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal = Σ unit_price × quantity                                    │
//! │  tax      = compute_tax(subtotal, lines, policy)                       │
//! │  discount = fixed value | round(subtotal × pct)                        │
//! │                                                                         │
//! │  tax inside price:  total = subtotal − discount                        │
//! │  tax on top:        total = subtotal + tax − discount                  │
//! │                                                                         │
//! │  change = max(0, paid − total)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are not clamped. A fixed discount larger than the subtotal gives
//! a negative total and it is up to the caller to decide what to do.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartLine;
use crate::money::Money;
use crate::settings::TaxPolicy;
use crate::tax::compute_tax;
use crate::types::Percent;
use crate::validation::{validate_discount, ValidationResult};

// =============================================================================
// Discount
// =============================================================================

/// A discount applied to the whole sale.
///
/// Serialized as `{"type": "percentage", "value": 1000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DiscountSpec {
    #[default]
    None,
    /// Share of the subtotal.
    Percentage(Percent),
    /// Flat amount off.
    Fixed(Money),
}

impl DiscountSpec {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_discount(self)
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DiscountSpec::None)
    }
}

/// Discount amount for a subtotal.
pub fn discount_amount(subtotal: Money, discount: &DiscountSpec) -> Money {
    match discount {
        DiscountSpec::None => Money::zero(),
        DiscountSpec::Percentage(rate) => subtotal.apply_rate(*rate),
        DiscountSpec::Fixed(amount) => *amount,
    }
}

// =============================================================================
// Totals
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl Totals {
    /// Change owed for `paid`; never negative.
    pub fn change_due(&self, paid: Money) -> Money {
        change_due(self.total, paid)
    }
}

/// Computes the totals for a set of lines.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::settings::TaxPolicy;
/// use tally_core::totals::{compute_totals, DiscountSpec};
///
/// let totals = compute_totals(&[], &DiscountSpec::Fixed(Money::from_minor(500)), &TaxPolicy::disabled());
/// assert_eq!(totals.total.minor(), -500);
/// ```
pub fn compute_totals(lines: &[CartLine], discount: &DiscountSpec, policy: &TaxPolicy) -> Totals {
    let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
    let tax = compute_tax(subtotal, lines, policy);
    let discount = discount_amount(subtotal, discount);

    let total = if policy.enable_tax && policy.tax_included_in_price {
        subtotal - discount
    } else {
        subtotal + tax - discount
    };

    Totals {
        subtotal,
        tax,
        discount,
        total,
    }
}

/// `max(0, paid − total)`.
pub fn change_due(total: Money, paid: Money) -> Money {
    (paid - total).clamp_non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================
