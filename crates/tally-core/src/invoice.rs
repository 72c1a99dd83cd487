//! # Invoice
//!
//! Builds the immutable record of a completed sale.
//!
//! ## Checkout to Invoice
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Invoice Assembly                                │
//! │                                                                         │
//! │  InvoiceDraft (cart, discount, customer, cashier, branch, payment)     │
//! │       │                                                                 │
//! │       ├── cart empty?           → EmptyCart                            │
//! │       ├── paid < 0 / bad disc.? → Validation                           │
//! │       ├── compute_totals()        (same call as the live preview)      │
//! │       ├── cash and paid < total → InsufficientPayment                  │
//! │       ▼                                                                 │
//! │  Invoice { number: INV-00042, lines, payment { total, paid, change } } │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The number is allocated by the caller from the branch counter; this
//! module only renders it.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settings::Settings;
use crate::totals::{compute_totals, DiscountSpec};
use crate::types::{BranchRef, CashierRef, CustomerRef, PaymentMethod};
use crate::validation::validate_payment_amount;
use crate::INVOICE_SEQUENCE_WIDTH;

// =============================================================================
// Invoice Number
// =============================================================================

/// A display number such as `INV-00042`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InvoiceNumber {
    display: String,
    sequence: i64,
}

impl InvoiceNumber {
    /// Renders `prefix` followed by the sequence zero-padded to five digits.
    /// Sequences wider than five digits are rendered in full.
    ///
    /// ```rust
    /// use tally_core::invoice::InvoiceNumber;
    ///
    /// assert_eq!(InvoiceNumber::new("INV-", 42).as_str(), "INV-00042");
    /// assert_eq!(InvoiceNumber::new("A", 123_456).as_str(), "A123456");
    /// ```
    pub fn new(prefix: &str, sequence: i64) -> Self {
        InvoiceNumber {
            display: format!(
                "{}{:0width$}",
                prefix,
                sequence,
                width = INVOICE_SEQUENCE_WIDTH
            ),
            sequence,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.display
    }

    pub fn sequence(&self) -> i64 {
        self.sequence
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLine {
    pub product_id: String,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoicePayment {
    pub method: PaymentMethod,
    pub total: Money,
    pub paid: Money,
    pub change: Money,
}

/// A completed sale. Never modified after it is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    /// Display number, e.g. `INV-00042`.
    pub number: String,
    /// Numeric part of `number`, for ordering.
    pub sequence: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub cashier: CashierRef,
    pub branch: BranchRef,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    pub lines: Vec<InvoiceLine>,
    pub payment: InvoicePayment,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    #[serde(default)]
    pub discount_spec: DiscountSpec,
    /// Whether `tax` is already inside `subtotal`.
    #[serde(default)]
    pub tax_included: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Invoice {
    pub fn total(&self) -> Money {
        self.payment.total
    }

    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Whether the invoice was created in the given calendar month (UTC).
    pub fn is_in_period(&self, year: i32, month: u32) -> bool {
        self.created_at.year() == year && self.created_at.month() == month
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Everything needed to settle a sale except the number and the clock.
#[derive(Debug, Clone)]
pub struct InvoiceDraft<'a> {
    pub cart: &'a Cart,
    pub discount: DiscountSpec,
    pub customer: Option<CustomerRef>,
    pub cashier: CashierRef,
    pub branch: BranchRef,
    pub payment_method: PaymentMethod,
    pub paid: Money,
    pub notes: Option<String>,
}

/// Assembles an invoice from a draft.
///
/// No state is touched; on error the cart can be reused as is.
pub fn build_invoice(
    draft: InvoiceDraft<'_>,
    number: &InvoiceNumber,
    settings: &Settings,
    now: DateTime<Utc>,
) -> CoreResult<Invoice> {
    if draft.cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    validate_payment_amount(draft.paid)?;
    draft.discount.validate()?;

    let totals = compute_totals(draft.cart.lines(), &draft.discount, &settings.tax);

    if draft.payment_method.requires_full_tender() && draft.paid < totals.total {
        return Err(CoreError::InsufficientPayment {
            total: totals.total,
            paid: draft.paid,
        });
    }

    let lines = draft
        .cart
        .lines()
        .iter()
        .map(|line| InvoiceLine {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            price: line.unit_price,
            quantity: line.quantity,
            subtotal: line.line_total(),
        })
        .collect();

    let notes = draft
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Invoice {
        number: number.as_str().to_string(),
        sequence: number.sequence(),
        created_at: now,
        cashier: draft.cashier,
        branch: draft.branch,
        customer: draft.customer,
        lines,
        payment: InvoicePayment {
            method: draft.payment_method,
            total: totals.total,
            paid: draft.paid,
            change: totals.change_due(draft.paid),
        },
        subtotal: totals.subtotal,
        tax: totals.tax,
        discount: totals.discount,
        discount_spec: draft.discount,
        tax_included: settings.tax.enable_tax && settings.tax.tax_included_in_price,
        notes,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
