//! # Checkout Service
//!
//! Cart editing against the session's product cache, and the write
//! sequence that turns a paid cart into an invoice.
//!
//! ## Completion Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  complete_checkout(paid, method, customer, notes)                       │
//! │                                                                         │
//! │  1. Validate draft (cart, stock, tender, discount)    ─┐               │
//! │  2. increment counters/invoices/{branch}               │ failure:       │
//! │  3. Build invoice {prefix}{seq:05}                     │ abort, cart    │
//! │  4. push invoices/{branch}                            ─┘ unchanged      │
//! │  ─────────────────────────── invoice is durable ─────────────────────── │
//! │  5. update {products/{b}/{id}/stock: level, ...} + cache                │
//! │  6. increment customers/{id}/points                    failure:        │
//! │  7. push activity_logs                                 warning on       │
//! │  8. settle session                                     the receipt      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 5-7 are not rolled back when a later one fails. A gap in the
//! invoice sequence is possible when step 4 fails after step 2.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tally_core::{
    apply_invoice_to_stock, build_invoice, format_currency, ActivityLog, AddOutcome,
    CheckoutState, CoreError, CustomerRef, DiscountSpec, Invoice, InvoiceNumber, Money,
    PaymentMethod, Totals,
};
use tally_store::{paths, push_typed, DataStore, StoreError};
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::session::{load_product_index, Session};

/// What the UI shows after a completed sale.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    /// Store key of the invoice document.
    pub invoice_id: String,
    pub invoice: Invoice,
    pub formatted_total: String,
    pub formatted_change: String,
    pub points_earned: i64,
    /// Units sold beyond the known stock, per product.
    pub backorders: BTreeMap<String, i64>,
    /// Products on this invoice now at or below the low-stock threshold.
    pub low_stock: Vec<String>,
    /// Follow-up writes that failed after the invoice was saved.
    pub warnings: Vec<String>,
}

impl CheckoutReceipt {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    store: Arc<dyn DataStore>,
}

impl CheckoutService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        CheckoutService { store }
    }

    /// Refreshes the session's product cache from the store.
    pub async fn load_products(&self, session: &mut Session) -> Result<usize, ApiError> {
        session.products = load_product_index(self.store.as_ref(), &session.branch.id).await?;
        debug!(count = session.products.len(), "Products reloaded");
        Ok(session.products.len())
    }

    // -------------------------------------------------------------------------
    // Cart editing
    // -------------------------------------------------------------------------

    pub fn add_to_cart(&self, session: &mut Session, product_id: &str) -> Result<AddOutcome, ApiError> {
        let product = session
            .products
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let outcome = session.checkout.add_product(product, &session.settings.pos)?;
        debug!(product = %product_id, ?outcome, "Added to cart");
        Ok(outcome)
    }

    /// Scanner path: resolves the barcode in the cache, then adds.
    pub fn scan_barcode(&self, session: &mut Session, barcode: &str) -> Result<AddOutcome, ApiError> {
        let product_id = session
            .products
            .find_by_barcode(barcode)
            .map(|p| p.id.clone())
            .ok_or_else(|| ApiError::not_found("Barcode", barcode))?;
        self.add_to_cart(session, &product_id)
    }

    pub fn set_quantity(
        &self,
        session: &mut Session,
        product_id: &str,
        quantity: i64,
    ) -> Result<(), ApiError> {
        let product = session
            .products
            .get(product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
        session
            .checkout
            .set_quantity(product, quantity, &session.settings.pos)?;
        Ok(())
    }

    pub fn remove_from_cart(&self, session: &mut Session, product_id: &str) -> Result<(), ApiError> {
        session.checkout.remove_line(product_id)?;
        Ok(())
    }

    pub fn apply_discount(&self, session: &mut Session, discount: DiscountSpec) -> Result<(), ApiError> {
        discount.validate()?;
        session.checkout.set_discount(discount)?;
        Ok(())
    }

    pub fn set_customer(
        &self,
        session: &mut Session,
        customer: Option<CustomerRef>,
    ) -> Result<(), ApiError> {
        session.checkout.set_customer(customer)?;
        Ok(())
    }

    pub fn clear_cart(&self, session: &mut Session) -> Result<(), ApiError> {
        session.checkout.clear()?;
        Ok(())
    }

    pub fn summary(&self, session: &Session) -> Totals {
        session.checkout.summary(&session.settings.tax)
    }

    pub fn begin_payment(&self, session: &mut Session) -> Result<Totals, ApiError> {
        session.checkout.begin_payment()?;
        Ok(self.summary(session))
    }

    pub fn cancel_payment(&self, session: &mut Session) -> Result<(), ApiError> {
        session.checkout.cancel_payment()?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Settles the current sale.
    ///
    /// A sale still in `Building` is moved to payment first. Anything that
    /// fails before the invoice is written leaves the cart and stock as
    /// they were.
    pub async fn complete_checkout(
        &self,
        session: &mut Session,
        paid: Money,
        method: PaymentMethod,
        customer: Option<CustomerRef>,
        notes: Option<String>,
    ) -> Result<CheckoutReceipt, ApiError> {
        let auto_began = session.checkout.state() == CheckoutState::Building;
        if auto_began {
            session.checkout.begin_payment()?;
        }

        match self.write_invoice(session, paid, method, customer, notes).await {
            Ok((invoice_id, invoice)) => Ok(self.finish(session, invoice_id, invoice).await),
            Err(err) => {
                if auto_began {
                    // Back to editing, the cart itself was never touched.
                    session.checkout.cancel_payment()?;
                }
                Err(err)
            }
        }
    }

    /// Steps 1-4. Nothing in the session changes here.
    async fn write_invoice(
        &self,
        session: &Session,
        paid: Money,
        method: PaymentMethod,
        customer: Option<CustomerRef>,
        notes: Option<String>,
    ) -> Result<(String, Invoice), ApiError> {
        let mut draft = session.checkout.draft(
            session.cashier.clone(),
            session.branch.clone(),
            method,
            paid,
            notes,
        )?;
        if customer.is_some() {
            draft.customer = customer;
        }
        // Lines may predate a sale that drained the stock (held orders).
        session
            .checkout
            .check_stock(&session.products, &session.settings.pos)?;

        let now = Utc::now();
        let prefix = &session.settings.invoice.prefix;

        // Reject bad tenders before a sequence number is consumed.
        build_invoice(draft.clone(), &InvoiceNumber::new(prefix, 0), &session.settings, now)?;

        let sequence = self
            .store
            .increment(&paths::invoice_counter(&session.branch.id), 1)
            .await?;
        let number = InvoiceNumber::new(prefix, sequence);
        let invoice = build_invoice(draft, &number, &session.settings, now)?;

        let invoice_id = push_typed(self.store.as_ref(), &paths::invoices(&session.branch.id), &invoice)
            .await
            .map_err(|e| {
                warn!(invoice = %number, error = %e, "Invoice write failed, sale aborted");
                ApiError::from(e)
            })?;

        info!(
            invoice = %number,
            id = %invoice_id,
            total = %invoice.total(),
            method = %invoice.payment.method,
            "Invoice saved"
        );
        Ok((invoice_id, invoice))
    }

    /// Steps 5-8. Failures are collected, never returned.
    async fn finish(&self, session: &mut Session, invoice_id: String, invoice: Invoice) -> CheckoutReceipt {
        let mut warnings = Vec::new();
        let branch_id = session.branch.id.clone();

        // 5. Stock
        let adjustment = apply_invoice_to_stock(&invoice, &session.products);
        for id in &adjustment.missing {
            warn!(product = %id, "Sold product missing from cache, stock not adjusted");
            warnings.push(format!("Stock for {} was not adjusted: product unknown", id));
        }
        if !adjustment.is_empty() {
            let writes: BTreeMap<String, serde_json::Value> = adjustment
                .levels
                .iter()
                .map(|(id, level)| (paths::product_stock(&branch_id, id), json!(level)))
                .collect();

            match self.store.update(writes).await {
                Ok(()) => session.products.apply(&adjustment),
                Err(e) => {
                    warn!(invoice = %invoice.number, error = %e, "Stock update failed");
                    warnings.push(format!("Stock levels were not updated: {}", e));
                }
            }
        }
        for (id, short) in &adjustment.backorders {
            info!(product = %id, short, "Sold beyond known stock");
        }

        // 6. Loyalty
        let mut points_earned = 0;
        if let Some(customer) = &invoice.customer {
            let points = session.settings.loyalty.points_for(invoice.total());
            if points > 0 {
                match self.credit_points(&customer.id, points).await {
                    Ok(None) => {
                        warn!(customer = %customer.id, "Customer not found, points not credited");
                        warnings.push(format!(
                            "{} points were not credited: customer {} not found",
                            points, customer.name
                        ));
                    }
                    Ok(Some(balance)) => {
                        debug!(customer = %customer.id, points, balance, "Points credited");
                        points_earned = points;
                    }
                    Err(e) => {
                        warn!(customer = %customer.id, error = %e, "Points credit failed");
                        warnings.push(format!("{} points were not credited to {}", points, customer.name));
                    }
                }
            }
        }

        // 7. Audit
        let currency = &session.settings.currency;
        let formatted_total = format_currency(invoice.total(), currency);
        let log = ActivityLog {
            user_id: session.cashier.id.clone(),
            user_name: session.cashier.full_name.clone(),
            branch_id: branch_id.clone(),
            action: "sale".to_string(),
            details: format!("Invoice {} for {}", invoice.number, formatted_total),
            timestamp: invoice.created_at,
        };
        if let Err(e) = push_typed(self.store.as_ref(), paths::ACTIVITY_LOGS, &log).await {
            warn!(invoice = %invoice.number, error = %e, "Activity log write failed");
            warnings.push("Activity log entry was not written".to_string());
        }

        // 8. Settle. The state is AwaitingPayment here, so this cannot fail.
        if let Err(e) = session.checkout.settle() {
            warn!(error = %e, "Session could not be settled");
        }

        let low_stock = session
            .products
            .low_stock(session.settings.pos.low_stock_threshold)
            .into_iter()
            .filter(|p| invoice.lines.iter().any(|l| l.product_id == p.id))
            .map(|p| p.name.clone())
            .collect();

        info!(
            invoice = %invoice.number,
            total = %formatted_total,
            warnings = warnings.len(),
            "Checkout complete"
        );

        CheckoutReceipt {
            invoice_id,
            formatted_change: format_currency(invoice.payment.change, currency),
            formatted_total,
            points_earned,
            backorders: adjustment.backorders,
            low_stock,
            warnings,
            invoice,
        }
    }

    /// Credits an existing customer. `None`, with nothing written, when the
    /// customer record is missing.
    async fn credit_points(&self, customer_id: &str, points: i64) -> Result<Option<i64>, StoreError> {
        if self.store.get(&paths::customer(customer_id)).await?.is_none() {
            return Ok(None);
        }
        let balance = self
            .store
            .increment(&paths::customer_points(customer_id), points)
            .await?;
        Ok(Some(balance))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
