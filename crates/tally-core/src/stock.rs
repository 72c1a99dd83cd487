//! # Stock
//!
//! Computes post-sale stock levels and keeps the local product cache in
//! step with what was written to the store.
//!
//! ## Post-Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice lines ──► apply_invoice_to_stock(&invoice, &index)            │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 StockAdjustment                                         │
//! │                 ├── levels:     p1 → 3            (written to store)    │
//! │                 ├── backorders: p2 → 1            (sold beyond stock)   │
//! │                 └── missing:    [p9]              (not in the index)    │
//! │                          │                                              │
//! │                          ▼                                              │
//! │                 index.apply(&adjustment)  (cache matches the store)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! New levels never go below zero. Units sold past the known stock are
//! reported as backorders instead.

use std::collections::BTreeMap;

use crate::invoice::Invoice;
use crate::types::Product;

// =============================================================================
// Product Index
// =============================================================================

/// The branch's product cache, keyed by product id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductIndex {
    products: BTreeMap<String, Product>,
}

impl ProductIndex {
    pub fn new() -> Self {
        ProductIndex::default()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn insert(&mut self, product: Product) {
        self.products.insert(product.id.clone(), product);
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.values()
    }

    /// Exact barcode match, the scanner path.
    pub fn find_by_barcode(&self, barcode: &str) -> Option<&Product> {
        let barcode = barcode.trim();
        self.products
            .values()
            .find(|p| p.barcode.as_deref() == Some(barcode))
    }

    /// Writes adjusted levels into the cache.
    pub fn apply(&mut self, adjustment: &StockAdjustment) {
        for (id, level) in &adjustment.levels {
            if let Some(product) = self.products.get_mut(id) {
                product.stock = *level;
            }
        }
    }

    /// Products at or below `threshold`, lowest stock first.
    pub fn low_stock(&self, threshold: i64) -> Vec<&Product> {
        low_stock(self.products.values(), threshold)
    }
}

impl FromIterator<Product> for ProductIndex {
    fn from_iter<I: IntoIterator<Item = Product>>(iter: I) -> Self {
        let mut index = ProductIndex::new();
        for product in iter {
            index.insert(product);
        }
        index
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockAdjustment {
    /// New stock level per product.
    pub levels: BTreeMap<String, i64>,
    /// Units sold beyond the known stock.
    pub backorders: BTreeMap<String, i64>,
    /// Invoice lines whose product is not in the index.
    pub missing: Vec<String>,
}

impl StockAdjustment {
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Computes `max(0, stock − sold)` for every product on the invoice.
///
/// Lines for the same product are summed first.
pub fn apply_invoice_to_stock(invoice: &Invoice, index: &ProductIndex) -> StockAdjustment {
    let mut sold: BTreeMap<&str, i64> = BTreeMap::new();
    for line in &invoice.lines {
        *sold.entry(line.product_id.as_str()).or_insert(0) += line.quantity;
    }

    let mut adjustment = StockAdjustment::default();
    for (id, quantity) in sold {
        let Some(product) = index.get(id) else {
            adjustment.missing.push(id.to_string());
            continue;
        };

        let remaining = product.stock - quantity;
        adjustment.levels.insert(id.to_string(), remaining.max(0));

        let short = quantity - product.stock.max(0);
        if short > 0 {
            adjustment.backorders.insert(id.to_string(), short);
        }
    }
    adjustment
}

/// Products whose stock is at or below `threshold`, lowest first.
pub fn low_stock<'a, I>(products: I, threshold: i64) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    let mut low: Vec<&Product> = products
        .into_iter()
        .filter(|p| p.stock <= threshold)
        .collect();
    low.sort_by(|a, b| a.stock.cmp(&b.stock).then_with(|| a.name.cmp(&b.name)));
    low
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::{InvoiceLine, InvoicePayment};
    use crate::money::Money;
    use crate::totals::DiscountSpec;
    use crate::types::{BranchRef, CashierRef, PaymentMethod};
    use chrono::Utc;

    fn product(id: &str, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: id.to_uppercase(),
            price: Money::from_minor(100),
            category_id: None,
            stock,
            barcode: Some(format!("000{}", id)),
            description: None,
            branch_id: "b1".to_string(),
        }
    }

    fn invoice(lines: &[(&str, i64)]) -> Invoice {
        Invoice {
            number: "INV-00001".to_string(),
            sequence: 1,
            created_at: Utc::now(),
            cashier: CashierRef {
                id: "u1".to_string(),
                full_name: "Ana".to_string(),
            },
            branch: BranchRef {
                id: "b1".to_string(),
                name: "Main".to_string(),
            },
            customer: None,
            lines: lines
                .iter()
                .map(|(id, qty)| InvoiceLine {
                    product_id: id.to_string(),
                    name: id.to_string(),
                    price: Money::from_minor(100),
                    quantity: *qty,
                    subtotal: Money::from_minor(100 * qty),
                })
                .collect(),
            payment: InvoicePayment {
                method: PaymentMethod::Cash,
                total: Money::zero(),
                paid: Money::zero(),
                change: Money::zero(),
            },
            subtotal: Money::zero(),
            tax: Money::zero(),
            discount: Money::zero(),
            discount_spec: DiscountSpec::None,
            tax_included: false,
            notes: None,
        }
    }

    #[test]
    fn test_simple_adjustment() {
        let index: ProductIndex = vec![product("p1", 5)].into_iter().collect();
        let adjustment = apply_invoice_to_stock(&invoice(&[("p1", 2)]), &index);
        assert_eq!(adjustment.levels.get("p1"), Some(&3));
        assert!(adjustment.backorders.is_empty());
        assert!(adjustment.missing.is_empty());
    }

    #[test]
    fn test_clamps_at_zero_and_reports_backorder() {
        let index: ProductIndex = vec![product("p1", 2), product("p2", -1)].into_iter().collect();
        let adjustment = apply_invoice_to_stock(&invoice(&[("p1", 5), ("p2", 1)]), &index);
        assert_eq!(adjustment.levels.get("p1"), Some(&0));
        assert_eq!(adjustment.backorders.get("p1"), Some(&3));
        assert_eq!(adjustment.levels.get("p2"), Some(&0));
        assert_eq!(adjustment.backorders.get("p2"), Some(&1));
    }

    #[test]
    fn test_duplicate_lines_accumulate_and_missing_reported() {
        let index: ProductIndex = vec![product("p1", 10)].into_iter().collect();
        let adjustment = apply_invoice_to_stock(&invoice(&[("p1", 2), ("p9", 1), ("p1", 3)]), &index);
        assert_eq!(adjustment.levels.get("p1"), Some(&5));
        assert_eq!(adjustment.missing, vec!["p9".to_string()]);
    }

    #[test]
    fn test_index_apply_keeps_cache_in_step() {
        let mut index: ProductIndex = vec![product("p1", 5), product("p2", 9)].into_iter().collect();
        let adjustment = apply_invoice_to_stock(&invoice(&[("p1", 2)]), &index);
        index.apply(&adjustment);
        assert_eq!(index.get("p1").unwrap().stock, 3);
        assert_eq!(index.get("p2").unwrap().stock, 9);
    }

    #[test]
    fn test_low_stock_and_barcode_lookup() {
        let index: ProductIndex = vec![product("a", 7), product("b", 1), product("c", 5)]
            .into_iter()
            .collect();
        let low: Vec<&str> = index.low_stock(5).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(low, vec!["b", "c"]);

        assert_eq!(index.find_by_barcode(" 000a ").map(|p| p.id.as_str()), Some("a"));
        assert!(index.find_by_barcode("nope").is_none());
    }
}
