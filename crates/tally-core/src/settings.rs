//! # Settings
//!
//! The application settings object, resolved once at session start.
//!
//! ## Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Settings Lifecycle                                   │
//! │                                                                         │
//! │  Data Store ("settings" document)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  serde: required sections must be present ── missing? → fail           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Settings::validate() ── impossible values? → fail                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Read-only for the rest of the session                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no silent business defaults in formulas: a tax rate only
//! exists once a [`TaxPolicy`] has been deserialized and validated.
//! `Settings::default()` exists for seeding and tests.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::Percent;
use crate::validation::{validate_required, validate_tax_rate_bps, ValidationResult};

/// Most decimal places a currency may show or store.
pub const MAX_CURRENCY_DIGITS: u8 = 4;

/// Longest allowed invoice prefix.
pub const MAX_INVOICE_PREFIX_LEN: usize = 10;

// =============================================================================
// Settings
// =============================================================================

/// Complete application settings.
///
/// ## Example Document
/// ```json
/// {
///   "store":    { "name": "Corner Shop" },
///   "currency": { "code": "USD", "symbol": "$" },
///   "tax":      { "enable_tax": true, "tax_rate": 1500,
///                 "tax_included_in_price": false, "apply_tax_per_item": false },
///   "pos":      { "allow_sell_out_of_stock": false, "low_stock_threshold": 5 },
///   "invoice":  { "prefix": "INV-" },
///   "loyalty":  { "enabled": true, "spend_per_point": 1000 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Settings {
    pub store: StoreInfo,
    pub currency: CurrencySettings,
    pub tax: TaxPolicy,
    pub pos: PosBehavior,
    pub invoice: InvoiceSettings,
    #[serde(default)]
    pub loyalty: LoyaltySettings,
}

impl Settings {
    /// Validates every section.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_required("store.name", &self.store.name)?;
        self.currency.validate()?;
        validate_tax_rate_bps(self.tax.tax_rate.bps())?;
        self.pos.validate()?;
        self.invoice.validate()?;
        self.loyalty.validate()?;
        Ok(())
    }
}

impl Default for Settings {
    /// Development defaults: USD, 15% additive tax, no over-selling.
    fn default() -> Self {
        Settings {
            store: StoreInfo::default(),
            currency: CurrencySettings::default(),
            tax: TaxPolicy {
                enable_tax: true,
                tax_rate: Percent::from_bps(1500),
                tax_included_in_price: false,
                apply_tax_per_item: false,
            },
            pos: PosBehavior::default(),
            invoice: InvoiceSettings::default(),
            loyalty: LoyaltySettings::default(),
        }
    }
}

// =============================================================================
// Store Info
// =============================================================================

/// Receipt header details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoreInfo {
    pub name: String,
    #[serde(default)]
    pub address: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "Tally Dev Store".to_string(),
            address: vec!["123 Main Street".to_string()],
            phone: None,
        }
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Where the currency symbol goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SymbolPosition {
    #[default]
    Before,
    After,
}

/// Currency formatting rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencySettings {
    /// ISO 4217 code.
    pub code: String,
    pub symbol: String,
    #[serde(default)]
    pub symbol_position: SymbolPosition,
    #[serde(default)]
    pub space_between_symbol: bool,
    /// Number of decimal digits in one `Money` minor unit.
    #[serde(default = "default_digits")]
    pub minor_unit_digits: u8,
    /// Number of decimal places shown.
    #[serde(default = "default_digits")]
    pub decimal_places: u8,
    #[serde(default = "default_thousands_separator")]
    pub thousands_separator: String,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: String,
}

fn default_digits() -> u8 {
    2
}

fn default_thousands_separator() -> String {
    ",".to_string()
}

fn default_decimal_separator() -> String {
    ".".to_string()
}

impl Default for CurrencySettings {
    fn default() -> Self {
        CurrencySettings {
            code: "USD".to_string(),
            symbol: "$".to_string(),
            symbol_position: SymbolPosition::Before,
            space_between_symbol: false,
            minor_unit_digits: default_digits(),
            decimal_places: default_digits(),
            thousands_separator: default_thousands_separator(),
            decimal_separator: default_decimal_separator(),
        }
    }
}

impl CurrencySettings {
    fn validate(&self) -> ValidationResult<()> {
        validate_required("currency.code", &self.code)?;

        for (field, digits) in [
            ("currency.minor_unit_digits", self.minor_unit_digits),
            ("currency.decimal_places", self.decimal_places),
        ] {
            if digits > MAX_CURRENCY_DIGITS {
                return Err(ValidationError::OutOfRange {
                    field: field.to_string(),
                    min: 0,
                    max: MAX_CURRENCY_DIGITS as i64,
                });
            }
        }

        if self.decimal_places > 0 && self.decimal_separator.is_empty() {
            return Err(ValidationError::required("currency.decimal_separator"));
        }

        if self.thousands_separator == self.decimal_separator {
            return Err(ValidationError::InvalidFormat {
                field: "currency.thousands_separator".to_string(),
                reason: "must differ from the decimal separator".to_string(),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Tax Policy
// =============================================================================

/// How tax is computed and whether it is already inside the price.
///
/// All four fields are required in a settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxPolicy {
    pub enable_tax: bool,
    pub tax_rate: Percent,
    /// Displayed prices already contain the tax.
    pub tax_included_in_price: bool,
    /// Compute tax per line instead of on the aggregate subtotal.
    pub apply_tax_per_item: bool,
}

impl TaxPolicy {
    /// A policy that never charges tax.
    pub const fn disabled() -> Self {
        TaxPolicy {
            enable_tax: false,
            tax_rate: Percent::zero(),
            tax_included_in_price: false,
            apply_tax_per_item: false,
        }
    }

    /// The rate in effect: zero when tax is disabled.
    pub fn effective_rate(&self) -> Percent {
        if self.enable_tax {
            self.tax_rate
        } else {
            Percent::zero()
        }
    }
}

// =============================================================================
// POS Behaviour
// =============================================================================

/// Checkout behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PosBehavior {
    /// Allow quantities beyond known stock.
    pub allow_sell_out_of_stock: bool,
    /// Products at or below this level are reported as low stock.
    pub low_stock_threshold: i64,
}

impl Default for PosBehavior {
    fn default() -> Self {
        PosBehavior {
            allow_sell_out_of_stock: false,
            low_stock_threshold: 5,
        }
    }
}

impl PosBehavior {
    fn validate(&self) -> ValidationResult<()> {
        if self.low_stock_threshold < 0 {
            return Err(ValidationError::negative("pos.low_stock_threshold"));
        }
        Ok(())
    }
}

// =============================================================================
// Invoice Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceSettings {
    /// Prepended to the zero-padded sequence, e.g. `INV-00042`.
    pub prefix: String,
    #[serde(default)]
    pub footer: Option<String>,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        InvoiceSettings {
            prefix: "INV-".to_string(),
            footer: None,
        }
    }
}

impl InvoiceSettings {
    fn validate(&self) -> ValidationResult<()> {
        validate_required("invoice.prefix", &self.prefix)?;
        if self.prefix.chars().count() > MAX_INVOICE_PREFIX_LEN {
            return Err(ValidationError::TooLong {
                field: "invoice.prefix".to_string(),
                max: MAX_INVOICE_PREFIX_LEN,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Loyalty
// =============================================================================

/// Points accrual: one point per `spend_per_point` of invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoyaltySettings {
    pub enabled: bool,
    pub spend_per_point: Money,
}

impl Default for LoyaltySettings {
    fn default() -> Self {
        LoyaltySettings {
            enabled: false,
            spend_per_point: Money::from_major(10),
        }
    }
}

impl LoyaltySettings {
    /// Points earned for a settled total. Negative totals earn nothing.
    pub fn points_for(&self, total: Money) -> i64 {
        if !self.enabled || !self.spend_per_point.is_positive() || !total.is_positive() {
            return 0;
        }
        total.minor() / self.spend_per_point.minor()
    }

    fn validate(&self) -> ValidationResult<()> {
        if self.enabled && !self.spend_per_point.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "loyalty.spend_per_point".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_missing_tax_section_fails_to_parse() {
        let json = r#"{
            "store": { "name": "Shop" },
            "currency": { "code": "USD", "symbol": "$" },
            "pos": { "allow_sell_out_of_stock": false, "low_stock_threshold": 5 },
            "invoice": { "prefix": "INV-" }
        }"#;
        let parsed: Result<Settings, _> = serde_json::from_str(json);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_minimal_document_parses_with_formatting_defaults() {
        let json = r#"{
            "store": { "name": "Shop" },
            "currency": { "code": "EUR", "symbol": "€" },
            "tax": { "enable_tax": true, "tax_rate": 2000,
                     "tax_included_in_price": true, "apply_tax_per_item": false },
            "pos": { "allow_sell_out_of_stock": true, "low_stock_threshold": 2 },
            "invoice": { "prefix": "EU" }
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.currency.decimal_places, 2);
        assert_eq!(settings.tax.tax_rate, Percent::from_bps(2000));
        assert!(!settings.loyalty.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_impossible_values() {
        let mut settings = Settings::default();
        settings.tax.tax_rate = Percent::from_bps(10_001);
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.currency.decimal_places = 5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.currency.thousands_separator = ".".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.invoice.prefix = String::new();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.loyalty.enabled = true;
        settings.loyalty.spend_per_point = Money::zero();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_effective_rate() {
        let mut policy = Settings::default().tax;
        assert_eq!(policy.effective_rate().bps(), 1500);
        policy.enable_tax = false;
        assert!(policy.effective_rate().is_zero());
        assert!(TaxPolicy::disabled().effective_rate().is_zero());
    }

    #[test]
    fn test_points_for() {
        let loyalty = LoyaltySettings {
            enabled: true,
            spend_per_point: Money::from_major(10),
        };
        assert_eq!(loyalty.points_for(Money::from_major(95)), 9);
        assert_eq!(loyalty.points_for(Money::from_major(-5)), 0);
        assert_eq!(LoyaltySettings::default().points_for(Money::from_major(100)), 0);
    }
}
