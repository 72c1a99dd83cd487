//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  barcode        │   │  phone, email   │   │  base_salary    │       │
//! │  │  price (Money)  │   │  points         │   │  commission_rate│       │
//! │  │  stock          │   └─────────────────┘   │  allowance      │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Percent      │   │  PaymentMethod  │   │  Cashier/Branch │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  references     │       │
//! │  │  bps (u32)      │   │  Cash           │   │  stamped on     │       │
//! │  │  1500 = 15%     │   │  Card, Transfer │   │  invoices       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents carry no id field of their own when the Data Store assigns the
//! key; `id` is filled in by the caller after reading.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Percent
// =============================================================================

/// A rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (tax), 500 bps = 5% (commission)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Percent(u32);

impl Percent {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Percent(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    ///
    /// Negative and non-finite input becomes zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Percent(0);
        }
        Percent((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Percent(0)
    }

    /// Checks if rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Percent {
    fn default() -> Self {
        Percent::zero()
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percentage())
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale in a branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Store-assigned key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Category reference.
    #[serde(default)]
    pub category_id: Option<String>,

    /// Current stock level. Negative only when written by something other
    /// than the stock adjustment, which clamps at zero.
    #[serde(default)]
    pub stock: i64,

    /// Barcode, expected unique within a branch (not enforced).
    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Branch owning this stock.
    #[serde(default)]
    pub branch_id: String,
}

impl Product {
    /// Checks whether `quantity` units can be sold under the given policy.
    pub fn can_sell(&self, quantity: i64, allow_sell_out_of_stock: bool) -> bool {
        allow_sell_out_of_stock || self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with a loyalty points balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Accrued via purchases.
    #[serde(default)]
    pub points: i64,
}

impl Customer {
    /// Returns the reference stamped on invoices.
    pub fn reference(&self) -> CustomerRef {
        CustomerRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }
}

/// Customer snapshot stored on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Session References
// =============================================================================

/// Role of the signed-in user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Cashier,
}

/// Cashier snapshot stored on invoices and activity logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CashierRef {
    pub id: String,
    pub full_name: String,
}

/// Branch snapshot stored on invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BranchRef {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash; the only method that requires `paid >= total`.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank or wallet transfer.
    Transfer,
}

impl PaymentMethod {
    /// Whether the tendered amount must cover the total.
    pub fn requires_full_tender(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Transfer => write!(f, "transfer"),
        }
    }
}

// =============================================================================
// Employee
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
}

/// An employee eligible for payroll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Employee {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub base_salary: Money,
    /// Share of attributed sales paid as commission.
    #[serde(default)]
    pub commission_rate: Percent,
    #[serde(default)]
    pub allowance: Money,
    #[serde(default)]
    pub status: EmployeeStatus,
    #[serde(default)]
    pub branch_id: Option<String>,
}

// =============================================================================
// Activity Log
// =============================================================================

/// An audit entry written after notable actions such as a completed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityLog {
    pub user_id: String,
    pub user_name: String,
    pub branch_id: String,
    pub action: String,
    pub details: String,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
