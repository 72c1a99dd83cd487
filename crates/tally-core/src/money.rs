//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, plus the
//! display formatter driven by [`CurrencySettings`].
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A tax-inclusive total recomputed in two places with floats can        │
//! │  disagree by a cent between the cart preview and the saved invoice.    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    Every amount is a count of the currency's smallest unit.            │
//! │    Rates are basis points. Division rounds explicitly, once.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::Money;
//!
//! let price = Money::from_minor(1099); // 10.99 with two minor digits
//! let doubled = price * 2;
//! assert_eq!(doubled.minor(), 2198);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::settings::{CurrencySettings, SymbolPosition};
use crate::types::Percent;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts larger than the subtotal legitimately
///   produce negative totals, and refunds are negative
/// - **Scale-agnostic**: the number of minor digits lives in
///   [`CurrencySettings::minor_unit_digits`], not in the value
/// - **Saturating**: the operators clamp at the `i64` bounds rather than
///   panic or wrap on a corrupt stored amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a Money value from whole units, assuming two minor digits.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(10).minor(), 1000);
    /// ```
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(299);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `self × rate`, rounded half away from zero.
    ///
    /// Used for additive tax, percentage discounts and commission.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Percent;
    ///
    /// let amount = Money::from_minor(1000);
    /// // 10.00 × 8.25% = 0.825 → 0.83
    /// assert_eq!(amount.apply_rate(Percent::from_bps(825)).minor(), 83);
    /// ```
    pub fn apply_rate(&self, rate: Percent) -> Money {
        let scaled = round_div(self.0 as i128 * rate.bps() as i128, 10_000);
        Money(scaled as i64)
    }

    /// Backs the net amount out of a tax-inclusive amount:
    /// `self / (1 + rate)`, rounded half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    /// use tally_core::types::Percent;
    ///
    /// // 115.00 including 15% tax → 100.00 net
    /// let gross = Money::from_minor(11_500);
    /// assert_eq!(gross.net_of_inclusive_rate(Percent::from_bps(1500)).minor(), 10_000);
    /// ```
    pub fn net_of_inclusive_rate(&self, rate: Percent) -> Money {
        let net = round_div(
            self.0 as i128 * 10_000,
            10_000 + rate.bps() as i128,
        );
        Money(net as i64)
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Money {
        if self.0 < 0 {
            Money::zero()
        } else {
            self
        }
    }

    /// Parses a user-entered decimal amount (e.g. `"12.5"`) at the given
    /// number of minor digits. Returns `None` for non-numeric input.
    pub fn parse_decimal(input: &str, minor_unit_digits: u8) -> Option<Money> {
        let value: f64 = input.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let scaled = (value * 10f64.powi(minor_unit_digits as i32)).round();
        if scaled.abs() >= i64::MAX as f64 {
            return None;
        }
        Some(Money(scaled as i64))
    }
}

/// Integer division rounding half away from zero.
pub(crate) fn round_div(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats an amount for display.
///
/// ## Rules
/// - Rescales from `minor_unit_digits` to `decimal_places`, rounding half
///   away from zero when the display is coarser than the stored unit
/// - Groups the whole part with `thousands_separator` every three digits
/// - Places the symbol before or after, with an optional space
///
/// ## Example
/// ```rust
/// use tally_core::money::{format_currency, Money};
/// use tally_core::settings::CurrencySettings;
///
/// let currency = CurrencySettings::default();
/// assert_eq!(format_currency(Money::from_minor(123_456_789), &currency), "$1,234,567.89");
/// ```
pub fn format_currency(amount: Money, currency: &CurrencySettings) -> String {
    let stored = currency.minor_unit_digits as u32;
    let shown = currency.decimal_places as u32;

    let value = amount.minor() as i128;
    let scaled = if shown >= stored {
        value * 10_i128.pow(shown - stored)
    } else {
        round_div(value, 10_i128.pow(stored - shown))
    };

    let negative = scaled < 0;
    let magnitude = scaled.unsigned_abs();
    let divisor = 10_u128.pow(shown);
    let whole = group_thousands(&(magnitude / divisor).to_string(), &currency.thousands_separator);

    let number = if shown > 0 {
        format!(
            "{}{}{:0width$}",
            whole,
            currency.decimal_separator,
            magnitude % divisor,
            width = shown as usize
        )
    } else {
        whole
    };

    let spacer = if currency.space_between_symbol { " " } else { "" };
    let body = match currency.symbol_position {
        SymbolPosition::Before => format!("{}{}{}", currency.symbol, spacer, number),
        SymbolPosition::After => format!("{}{}{}", number, spacer, currency.symbol),
    };

    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Formats raw user input; anything non-numeric is shown as zero.
pub fn format_currency_str(input: &str, currency: &CurrencySettings) -> String {
    let amount = Money::parse_decimal(input, currency.minor_unit_digits).unwrap_or_default();
    format_currency(amount, currency)
}

fn group_thousands(digits: &str, separator: &str) -> String {
    if separator.is_empty() || digits.len() <= 3 {
        return digits.to_string();
    }

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 * separator.len());
    let head = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - head) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(ch);
    }
    grouped
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain two-decimal rendering for logs and error messages.
///
/// Use [`format_currency`] for anything a customer sees.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(self.0.saturating_neg())
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
