//! # Tax
//!
//! ## Tax Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  enable_tax = false           → 0                                      │
//! │  apply_tax_per_item           → Σ round(price × qty × rate)            │
//! │  tax_included_in_price        → subtotal − round(subtotal / (1+rate))  │
//! │  otherwise (additive)         → round(subtotal × rate)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-item mode is checked before the inclusive flag and always computes
//! additive tax per line. Rounding is half away from zero throughout.

use crate::cart::CartLine;
use crate::money::Money;
use crate::settings::TaxPolicy;

/// Computes the tax for a cart.
///
/// `subtotal` must be the sum of `lines`; per-item mode ignores it.
///
/// ## Example
/// ```rust
/// use tally_core::money::Money;
/// use tally_core::settings::TaxPolicy;
/// use tally_core::tax::compute_tax;
/// use tally_core::types::Percent;
///
/// let policy = TaxPolicy {
///     enable_tax: true,
///     tax_rate: Percent::from_bps(1500),
///     tax_included_in_price: true,
///     apply_tax_per_item: false,
/// };
/// // 115.00 with 15% inside → 15.00 of tax
/// assert_eq!(compute_tax(Money::from_minor(11_500), &[], &policy).minor(), 1_500);
/// ```
pub fn compute_tax(subtotal: Money, lines: &[CartLine], policy: &TaxPolicy) -> Money {
    let rate = policy.effective_rate();
    if rate.is_zero() {
        return Money::zero();
    }

    if policy.apply_tax_per_item {
        return lines.iter().map(|line| line.line_total().apply_rate(rate)).sum();
    }

    if policy.tax_included_in_price {
        return subtotal - subtotal.net_of_inclusive_rate(rate);
    }

    subtotal.apply_rate(rate)
}

// =============================================================================
// Unit Tests
// =============================================================================
