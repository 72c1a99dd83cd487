//! # Cart
//!
//! The in-progress list of lines for the current checkout.
//!
//! ## Adding the Same Product Repeatedly
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product "Cola" (stock 3), allow_sell_out_of_stock = false             │
//! │                                                                         │
//! │  add #1 ─► new line, qty 1          Ok(Added)                          │
//! │  add #2 ─► qty 2                    Ok(Incremented { quantity: 2 })    │
//! │  add #3 ─► qty 3                    Ok(Incremented { quantity: 3 })    │
//! │  add #4 ─► qty stays 3              Err(InsufficientStock)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Name and unit price are snapshotted when a line is created, so a price
//! change mid-sale does not reprice the cart.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::settings::PosBehavior;
use crate::stock::ProductIndex;
use crate::types::Product;
use crate::validation::validate_quantity;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A single product line in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    /// Snapshot at add time.
    pub name: String,
    /// Snapshot at add time.
    pub unit_price: Money,
    pub quantity: i64,
    /// Stock level known when the line was last touched by an add.
    pub stock_at_add: i64,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
            stock_at_add: product.stock,
        }
    }

    /// `unit_price × quantity`.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// What [`Cart::add_line`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line with quantity 1.
    Added,
    /// An existing line was bumped to `quantity`.
    Incremented { quantity: i64 },
}

// =============================================================================
// Cart
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Rebuilds a cart from stored lines (held orders).
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Cart { lines }
    }

    /// Adds one unit of `product`.
    ///
    /// ## Errors
    /// - `InsufficientStock` when the bump would exceed known stock; the
    ///   line keeps its quantity
    /// - `OutOfStock` for a new line with nothing in stock
    /// - `CartTooLarge` / `QuantityTooLarge` at the hard limits
    ///
    /// Over-selling lifts the stock checks but not the hard limits.
    pub fn add_line(&mut self, product: &Product, pos: &PosBehavior) -> CoreResult<AddOutcome> {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity + 1;

            if !pos.allow_sell_out_of_stock && requested > product.stock {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock.max(0),
                    requested,
                });
            }

            if requested > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_ITEM_QUANTITY,
                });
            }

            line.quantity = requested;
            line.stock_at_add = product.stock;
            return Ok(AddOutcome::Incremented {
                quantity: requested,
            });
        }

        if !pos.allow_sell_out_of_stock && product.stock <= 0 {
            return Err(CoreError::OutOfStock {
                product: product.name.clone(),
            });
        }

        if self.lines.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.lines.push(CartLine::from_product(product));
        Ok(AddOutcome::Added)
    }

    /// Removes a line entirely.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<CartLine> {
        let index = self.position(product_id)?;
        Ok(self.lines.remove(index))
    }

    /// Sets a line's quantity directly (typed into the quantity field).
    ///
    /// Checked against `product.stock` as it is now, not the level seen
    /// when the line was added. Rejected values leave the previous
    /// quantity in place.
    pub fn set_quantity(
        &mut self,
        product: &Product,
        quantity: i64,
        pos: &PosBehavior,
    ) -> CoreResult<()> {
        let index = self.position(&product.id)?;
        validate_quantity(quantity)?;

        if !pos.allow_sell_out_of_stock && quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock.max(0),
                requested: quantity,
            });
        }

        let line = &mut self.lines[index];
        line.quantity = quantity;
        line.stock_at_add = product.stock;
        Ok(())
    }

    /// Fails on the first line asking for more than `products` holds.
    ///
    /// A line whose product is no longer indexed cannot be checked and is
    /// refused. Nothing is checked when over-selling is allowed.
    pub fn check_stock(&self, products: &ProductIndex, pos: &PosBehavior) -> CoreResult<()> {
        if pos.allow_sell_out_of_stock {
            return Ok(());
        }
        for line in &self.lines {
            let product = products
                .get(&line.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            if line.quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    product: line.name.clone(),
                    available: product.stock.max(0),
                    requested: line.quantity,
                });
            }
        }
        Ok(())
    }

    /// Σ `unit_price × quantity`.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn into_lines(self) -> Vec<CartLine> {
        self.lines
    }

    fn position(&self, product_id: &str) -> CoreResult<usize> {
        self.lines
            .iter()
            .position(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
