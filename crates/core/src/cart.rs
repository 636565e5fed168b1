//! Cart rules shared by the guest cart and checkout.
//!
//! A [`Cart`] is an ordered list of lines, one per product. The same limits
//! apply whether the cart lives in a guest session or in the backend, so
//! quantity checks are exposed as free functions as well.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CurrencyCode, Price, PriceError, ProductId};

/// Most units of a single product one order may hold.
pub const MAX_LINE_QUANTITY: u32 = 20;

/// Errors from cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    #[error("only {available} left in stock")]
    ExceedsStock { available: u32 },
    #[error("at most {max} of one item per order")]
    ExceedsLimit { max: u32 },
    #[error("item {0} is not in the cart")]
    LineNotFound(ProductId),
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Check a requested line quantity against stock and the per-line limit.
///
/// # Errors
///
/// Returns `ZeroQuantity`, `ExceedsStock` or `ExceedsLimit`.
pub fn validate_quantity(quantity: u32, max_stock: Option<u32>) -> Result<(), CartError> {
    if quantity == 0 {
        return Err(CartError::ZeroQuantity);
    }
    if let Some(available) = max_stock
        && quantity > available
    {
        return Err(CartError::ExceedsStock { available });
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(CartError::ExceedsLimit {
            max: MAX_LINE_QUANTITY,
        });
    }
    Ok(())
}

/// Clamp a quantity into the allowed range. May return 0 when nothing is in stock.
#[must_use]
pub fn clamp_quantity(quantity: u32, max_stock: Option<u32>) -> u32 {
    let limit = max_stock.map_or(MAX_LINE_QUANTITY, |s| s.min(MAX_LINE_QUANTITY));
    quantity.min(limit)
}

/// A single product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub quantity: u32,
    /// Stock known when the line was last touched.
    pub max_stock: Option<u32>,
    pub image_url: Option<String>,
}

impl CartLine {
    /// Unit price times quantity.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Overflow` for absurd quantities.
    pub fn line_total(&self) -> Result<Price, PriceError> {
        self.unit_price.times(self.quantity)
    }
}

/// An ordered cart with at most one line per product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// The merged quantity is validated against the incoming line's stock,
    /// which is the freshest figure available. Returns the line's new quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the resulting quantity is not allowed; the
    /// cart is left unchanged in that case.
    pub fn add(&mut self, line: CartLine) -> Result<u32, CartError> {
        if line.quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == line.product_id)
        else {
            validate_quantity(line.quantity, line.max_stock)?;
            let quantity = line.quantity;
            self.lines.push(line);
            return Ok(quantity);
        };

        let quantity = existing.quantity.saturating_add(line.quantity);
        validate_quantity(quantity, line.max_stock)?;
        existing.quantity = quantity;
        existing.unit_price = line.unit_price;
        existing.max_stock = line.max_stock;
        existing.name = line.name;
        if line.image_url.is_some() {
            existing.image_url = line.image_url;
        }
        Ok(quantity)
    }

    /// Set the quantity of an existing line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` for unknown products, or a quantity error.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), CartError> {
        let idx = self
            .position(product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;

        if quantity == 0 {
            self.lines.remove(idx);
            return Ok(());
        }

        let line = self
            .lines
            .get_mut(idx)
            .ok_or_else(|| CartError::LineNotFound(product_id.clone()))?;
        validate_quantity(quantity, line.max_stock)?;
        line.quantity = quantity;
        Ok(())
    }

    /// Record fresh stock for a line. Returns whether the line exists.
    pub fn set_stock(&mut self, product_id: &ProductId, stock: u32) -> bool {
        match self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            Some(line) => {
                line.max_stock = Some(stock);
                true
            }
            None => false,
        }
    }

    /// Remove a line. Returns whether it existed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        before != self.lines.len()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line totals. An empty cart is zero in `currency`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Price` if lines mix currencies.
    pub fn subtotal(&self, currency: CurrencyCode) -> Result<Price, CartError> {
        self.lines
            .iter()
            .try_fold(Price::zero(currency), |acc, line| {
                acc.checked_add(line.line_total()?)
            })
            .map_err(CartError::from)
    }

    /// Merge another cart into this one.
    ///
    /// Used when a guest logs in: nothing is rejected, quantities are clamped
    /// to stock and the per-line limit instead. Lines that end up with no
    /// stock at all are dropped.
    pub fn merge(&mut self, other: Self) {
        for incoming in other.lines {
            let merged = match self.position(&incoming.product_id) {
                Some(idx) => {
                    let Some(existing) = self.lines.get_mut(idx) else {
                        continue;
                    };
                    let stock = incoming.max_stock.or(existing.max_stock);
                    existing.quantity =
                        clamp_quantity(existing.quantity.saturating_add(incoming.quantity), stock);
                    existing.max_stock = stock;
                    existing.quantity
                }
                None => {
                    let quantity = clamp_quantity(incoming.quantity, incoming.max_stock);
                    self.lines.push(CartLine {
                        quantity,
                        ..incoming
                    });
                    quantity
                }
            };
            if merged == 0 {
                self.lines.retain(|l| l.quantity > 0);
            }
        }
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }
}

/// Lines reported by the backend are taken as-is; duplicate products are
/// folded together without enforcing limits.
impl FromIterator<CartLine> for Cart {
    fn from_iter<I: IntoIterator<Item = CartLine>>(iter: I) -> Self {
        let mut cart = Self::new();
        for line in iter {
            match cart.lines.iter_mut().find(|l| l.product_id == line.product_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(line.quantity);
                }
                None => cart.lines.push(line),
            }
        }
        cart
    }
}
