//! # Checkout
//!
//! The cashier's current sale as an explicit state machine.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────┐  add   ┌──────────┐ begin_payment ┌─────────────────┐        │
//! │   │ Idle │ ─────► │ Building │ ────────────► │ AwaitingPayment │        │
//! │   └──────┘ ◄───── └──────────┘ ◄──────────── └────────┬────────┘        │
//! │      ▲    cart        ▲        cancel_payment         │ settle          │
//! │      │   emptied      │ add                           ▼                 │
//! │      │                └──────────────────────── ┌─────────┐            │
//! │      └──────────────── reset ────────────────── │ Settled │            │
//! │                                                  └─────────┘            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is frozen while payment is being taken. A failed settlement
//! leaves the session in `AwaitingPayment` with the cart intact, so the
//! cashier can retry or cancel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::cart::{AddOutcome, Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::invoice::InvoiceDraft;
use crate::money::Money;
use crate::settings::{PosBehavior, TaxPolicy};
use crate::stock::ProductIndex;
use crate::totals::{compute_totals, DiscountSpec, Totals};
use crate::types::{BranchRef, CashierRef, CustomerRef, PaymentMethod, Product};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    #[default]
    Idle,
    Building,
    AwaitingPayment,
    Settled,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Building => "building",
            CheckoutState::AwaitingPayment => "awaiting payment",
            CheckoutState::Settled => "settled",
        };
        f.write_str(name)
    }
}

/// A parked sale, resumable later from the same branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HeldOrder {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub branch_id: String,
    pub cashier_id: String,
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub discount: DiscountSpec,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub note: Option<String>,
    #[ts(as = "String")]
    pub held_at: DateTime<Utc>,
}

impl HeldOrder {
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

// =============================================================================
// Session
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct CheckoutSession {
    state: CheckoutState,
    cart: Cart,
    discount: DiscountSpec,
    customer: Option<CustomerRef>,
}

impl CheckoutSession {
    pub fn new() -> Self {
        CheckoutSession::default()
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn discount(&self) -> &DiscountSpec {
        &self.discount
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    // -------------------------------------------------------------------------
    // Cart editing
    // -------------------------------------------------------------------------

    pub fn add_product(&mut self, product: &Product, pos: &PosBehavior) -> CoreResult<AddOutcome> {
        self.ensure_editable("add to cart")?;
        let outcome = self.cart.add_line(product, pos)?;
        self.sync_state();
        Ok(outcome)
    }

    pub fn set_quantity(&mut self, product: &Product, quantity: i64, pos: &PosBehavior) -> CoreResult<()> {
        self.ensure_editable("change quantity")?;
        self.cart.set_quantity(product, quantity, pos)
    }

    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<CartLine> {
        self.ensure_editable("remove from cart")?;
        let line = self.cart.remove_line(product_id)?;
        self.sync_state();
        Ok(line)
    }

    pub fn set_discount(&mut self, discount: DiscountSpec) -> CoreResult<()> {
        self.ensure_editable("change discount")?;
        discount.validate()?;
        self.discount = discount;
        Ok(())
    }

    pub fn set_customer(&mut self, customer: Option<CustomerRef>) -> CoreResult<()> {
        self.ensure_editable("change customer")?;
        self.customer = customer;
        Ok(())
    }

    /// Empties the cart and forgets discount and customer.
    pub fn clear(&mut self) -> CoreResult<()> {
        self.ensure_editable("clear the cart")?;
        self.wipe();
        self.state = CheckoutState::Idle;
        Ok(())
    }

    /// Live preview of the totals.
    pub fn summary(&self, tax: &TaxPolicy) -> Totals {
        compute_totals(self.cart.lines(), &self.discount, tax)
    }

    // -------------------------------------------------------------------------
    // Held orders
    // -------------------------------------------------------------------------

    /// Snapshot of the current sale for parking. The session is not changed.
    pub fn to_held_order(
        &self,
        branch_id: &str,
        cashier_id: &str,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<HeldOrder> {
        self.ensure_editable("hold the order")?;
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        Ok(HeldOrder {
            id: String::new(),
            branch_id: branch_id.to_string(),
            cashier_id: cashier_id.to_string(),
            lines: self.cart.lines().to_vec(),
            discount: self.discount,
            customer: self.customer.clone(),
            note,
            held_at: now,
        })
    }

    /// Loads a held order into an empty cart.
    pub fn load_held_order(&mut self, order: &HeldOrder) -> CoreResult<()> {
        self.ensure_editable("resume an order")?;
        if !self.cart.is_empty() {
            return Err(CoreError::InvalidCheckoutState {
                state: self.state.to_string(),
                operation: "resume an order into a non-empty cart".to_string(),
            });
        }
        self.cart = Cart::from_lines(order.lines.clone());
        self.discount = order.discount;
        self.customer = order.customer.clone();
        self.sync_state();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment
    // -------------------------------------------------------------------------

    pub fn begin_payment(&mut self) -> CoreResult<()> {
        if self.state != CheckoutState::Building {
            if self.cart.is_empty() {
                return Err(CoreError::EmptyCart);
            }
            return Err(self.invalid("begin payment"));
        }
        self.state = CheckoutState::AwaitingPayment;
        Ok(())
    }

    pub fn cancel_payment(&mut self) -> CoreResult<()> {
        if self.state != CheckoutState::AwaitingPayment {
            return Err(self.invalid("cancel payment"));
        }
        self.state = CheckoutState::Building;
        Ok(())
    }

    /// The invoice draft for the sale awaiting payment.
    pub fn draft(
        &self,
        cashier: CashierRef,
        branch: BranchRef,
        payment_method: PaymentMethod,
        paid: Money,
        notes: Option<String>,
    ) -> CoreResult<InvoiceDraft<'_>> {
        if self.cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        if self.state != CheckoutState::AwaitingPayment {
            return Err(self.invalid("take payment"));
        }
        Ok(InvoiceDraft {
            cart: &self.cart,
            discount: self.discount,
            customer: self.customer.clone(),
            cashier,
            branch,
            payment_method,
            paid,
            notes,
        })
    }

    /// Re-checks every line against current stock before payment is taken.
    pub fn check_stock(&self, products: &ProductIndex, pos: &PosBehavior) -> CoreResult<()> {
        self.cart.check_stock(products, pos)
    }

    /// Marks the sale as paid and clears it.
    pub fn settle(&mut self) -> CoreResult<()> {
        if self.state != CheckoutState::AwaitingPayment {
            return Err(self.invalid("settle"));
        }
        self.wipe();
        self.state = CheckoutState::Settled;
        Ok(())
    }

    /// Returns a settled (or idle/building) session to `Idle` with an
    /// empty cart.
    pub fn reset(&mut self) -> CoreResult<()> {
        self.ensure_editable("reset")?;
        self.wipe();
        self.state = CheckoutState::Idle;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn ensure_editable(&self, operation: &str) -> CoreResult<()> {
        if self.state == CheckoutState::AwaitingPayment {
            return Err(self.invalid(operation));
        }
        Ok(())
    }

    fn invalid(&self, operation: &str) -> CoreError {
        CoreError::InvalidCheckoutState {
            state: self.state.to_string(),
            operation: operation.to_string(),
        }
    }

    fn sync_state(&mut self) {
        self.state = if self.cart.is_empty() {
            CheckoutState::Idle
        } else {
            CheckoutState::Building
        };
    }

    fn wipe(&mut self) {
        self.cart.clear();
        self.discount = DiscountSpec::None;
        self.customer = None;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{build_invoice, InvoiceNumber};
    use crate::settings::Settings;
    use crate::types::Percent;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_string(),
            price: Money::from_minor(price),
            category_id: None,
            stock,
            barcode: None,
            description: None,
            branch_id: "b1".to_string(),
        }
    }

    fn cashier() -> CashierRef {
        CashierRef {
            id: "u1".to_string(),
            full_name: "Ana".to_string(),
        }
    }

    fn branch() -> BranchRef {
        BranchRef {
            id: "b1".to_string(),
            name: "Main".to_string(),
        }
    }

    #[test]
    fn test_happy_path_transitions() {
        let pos = PosBehavior::default();
        let mut session = CheckoutSession::new();
        assert_eq!(session.state(), CheckoutState::Idle);

        session.add_product(&product("p1", 1_000, 5), &pos).unwrap();
        assert_eq!(session.state(), CheckoutState::Building);

        session.begin_payment().unwrap();
        assert_eq!(session.state(), CheckoutState::AwaitingPayment);

        session.settle().unwrap();
        assert_eq!(session.state(), CheckoutState::Settled);
        assert!(session.cart().is_empty());

        session.reset().unwrap();
        assert_eq!(session.state(), CheckoutState::Idle);
    }

    #[test]
    fn test_cart_frozen_while_awaiting_payment() {
        let pos = PosBehavior::default();
        let mut session = CheckoutSession::new();
        session.add_product(&product("p1", 1_000, 5), &pos).unwrap();
        session.begin_payment().unwrap();

        assert!(matches!(
            session.add_product(&product("p2", 100, 5), &pos),
            Err(CoreError::InvalidCheckoutState { .. })
        ));
        assert!(session.set_quantity(&product("p1", 1_000, 5), 2, &pos).is_err());
        assert!(session.remove_line("p1").is_err());
        assert!(session.set_discount(DiscountSpec::None).is_err());
        assert!(session.clear().is_err());
        assert_eq!(session.cart().item_count(), 1);

        session.cancel_payment().unwrap();
        assert_eq!(session.state(), CheckoutState::Building);
        session.set_quantity(&product("p1", 1_000, 5), 2, &pos).unwrap();
    }

    #[test]
    fn test_begin_payment_requires_items() {
        let mut session = CheckoutSession::new();
        assert!(matches!(session.begin_payment(), Err(CoreError::EmptyCart)));
        assert!(session.cancel_payment().is_err());
        assert!(session.settle().is_err());
    }

    #[test]
    fn test_draft_of_empty_cart_reports_empty_cart() {
        let pos = PosBehavior::default();
        let mut session = CheckoutSession::new();
        let draft = |s: &CheckoutSession| {
            s.draft(cashier(), branch(), PaymentMethod::Cash, Money::zero(), None)
                .map(|_| ())
        };
        assert!(matches!(draft(&session), Err(CoreError::EmptyCart)));

        session.add_product(&product("p1", 1_000, 5), &pos).unwrap();
        session.begin_payment().unwrap();
        session.settle().unwrap();
        assert!(matches!(draft(&session), Err(CoreError::EmptyCart)));

        session.add_product(&product("p1", 1_000, 5), &pos).unwrap();
        assert!(matches!(
            draft(&session),
            Err(CoreError::InvalidCheckoutState { .. })
        ));
    }

    #[test]
    fn test_removing_last_line_returns_to_idle() {
        let pos = PosBehavior::default();
        let mut session = CheckoutSession::new();
        session.add_product(&product("p1", 100, 5), &pos).unwrap();
        session.remove_line("p1").unwrap();
        assert_eq!(session.state(), CheckoutState::Idle);
    }

    #[test]
    fn test_failed_settlement_keeps_cart() {
        let pos = PosBehavior::default();
        let settings = Settings::default();
        let mut session = CheckoutSession::new();
        session.add_product(&product("p1", 1_000, 5), &pos).unwrap();
        session.begin_payment().unwrap();

        let draft = session
            .draft(cashier(), branch(), PaymentMethod::Cash, Money::from_minor(10), None)
            .unwrap();
        let result = build_invoice(draft, &InvoiceNumber::new("INV-", 1), &settings, Utc::now());
        assert!(matches!(result, Err(CoreError::InsufficientPayment { .. })));

        assert_eq!(session.state(), CheckoutState::AwaitingPayment);
        assert_eq!(session.cart().item_count(), 1);
    }

    #[test]
    fn test_summary_matches_invoice() {
        let pos = PosBehavior::default();
        let settings = Settings::default();
        let mut session = CheckoutSession::new();
        session.add_product(&product("p1", 1_999, 5), &pos).unwrap();
        session.add_product(&product("p1", 1_999, 5), &pos).unwrap();
        session
            .set_discount(DiscountSpec::Percentage(Percent::from_bps(750)))
            .unwrap();
        let preview = session.summary(&settings.tax);

        session.begin_payment().unwrap();
        let draft = session
            .draft(cashier(), branch(), PaymentMethod::Card, preview.total, None)
            .unwrap();
        let invoice = build_invoice(draft, &InvoiceNumber::new("INV-", 1), &settings, Utc::now()).unwrap();

        assert_eq!(invoice.subtotal, preview.subtotal);
        assert_eq!(invoice.tax, preview.tax);
        assert_eq!(invoice.discount, preview.discount);
        assert_eq!(invoice.total(), preview.total);
    }

    #[test]
    fn test_hold_and_resume() {
        let pos = PosBehavior::default();
        let mut session = CheckoutSession::new();
        session.add_product(&product("p1", 500, 5), &pos).unwrap();
        session
            .set_discount(DiscountSpec::Fixed(Money::from_minor(50)))
            .unwrap();

        let held = session
            .to_held_order("b1", "u1", Some("table 4".to_string()), Utc::now())
            .unwrap();
        assert_eq!(held.subtotal(), Money::from_minor(500));

        session.clear().unwrap();
        session.load_held_order(&held).unwrap();
        assert_eq!(session.state(), CheckoutState::Building);
        assert_eq!(*session.discount(), DiscountSpec::Fixed(Money::from_minor(50)));

        assert!(session.load_held_order(&held).is_err());
    }
}
