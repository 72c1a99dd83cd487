//! # tally-core: Pure Business Logic for Tally POS
//!
//! This crate contains the checkout, invoice, stock and payroll rules of
//! Tally POS as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Browser UI (out of tree)                     │   │
//! │  │    Product Grid ──► Cart ──► Checkout Modal ──► Receipt         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-terminal (services)                       │   │
//! │  │    CheckoutService, PayrollService, held orders, customers      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │  money  │ │  cart   │ │ totals  │ │ invoice │ │ payroll │  │   │
//! │  │   │   tax   │ │checkout │ │  stock  │ │settings │ │validate │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORE • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-store (Data Store)                        │   │
//! │  │        path-addressed documents, memory or SQLite               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and currency formatting
//! - [`types`] - Domain types (Product, Customer, Employee, Percent, ...)
//! - [`tax`] - Tax computation for the three tax modes
//! - [`cart`] - Cart aggregation with stock limits
//! - [`totals`] - Discount/tax/total calculator (single source of truth)
//! - [`invoice`] - Immutable invoice snapshots
//! - [`stock`] - Post-sale stock levels
//! - [`payroll`] - Commission and net salary
//! - [`checkout`] - Checkout state machine
//! - [`settings`] - Validated application settings
//! - [`validation`] - Field-level rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::Money;
//! use tally_core::types::Percent;
//!
//! let subtotal = Money::from_minor(10_000); // 100.00
//! let tax = subtotal.apply_rate(Percent::from_bps(1500)); // 15%
//! assert_eq!(tax.minor(), 1_500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod error;
pub mod invoice;
pub mod money;
pub mod payroll;
pub mod settings;
pub mod stock;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{AddOutcome, Cart, CartLine};
pub use checkout::{CheckoutSession, CheckoutState, HeldOrder};
pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{build_invoice, Invoice, InvoiceDraft, InvoiceLine, InvoiceNumber, InvoicePayment};
pub use money::{format_currency, Money};
pub use payroll::{SalaryInput, SalaryPeriod, SalaryRecord};
pub use settings::{
    CurrencySettings, InvoiceSettings, LoyaltySettings, PosBehavior, Settings, StoreInfo,
    SymbolPosition, TaxPolicy,
};
pub use stock::{apply_invoice_to_stock, ProductIndex, StockAdjustment};
pub use totals::{compute_totals, DiscountSpec, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Applies even when over-selling is enabled, to catch typos such as
/// 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest unit price accepted, in minor units.
///
/// A full cart at this price and [`MAX_ITEM_QUANTITY`] still fits in `i64`.
pub const MAX_UNIT_PRICE_MINOR: i64 = 100_000_000_000;

/// Width of the numeric part of an invoice number.
pub const INVOICE_SEQUENCE_WIDTH: usize = 5;
