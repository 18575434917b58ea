//! Cart line items and cart math.
//!
//! The browser keeps the cart under the `burgerCart` key in `localStorage` as
//! a JSON array of [`CartLine`]s. The field names here are the ones that array
//! uses, so a cart posted by the browser deserializes into [`Cart`] as-is.
//!
//! Client-sent `total` values are ignored: [`Cart::normalized`] recomputes
//! every line from `basePrice`, extras and quantity. The unit prices
//! themselves are checked against the menu by the server before an order is
//! confirmed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{MenuItemId, Price};

/// Errors found while validating a cart.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CartError {
    /// No line items.
    #[error("the cart is empty")]
    Empty,

    /// A line has quantity zero.
    #[error("line {line} ({name}) must have a quantity of at least 1")]
    ZeroQuantity {
        /// Zero-based line index.
        line: usize,
        /// Product name on that line.
        name: String,
    },

    /// A base price or extra price is negative.
    #[error("line {line} ({name}) has a negative price")]
    NegativePrice {
        /// Zero-based line index.
        line: usize,
        /// Product name on that line.
        name: String,
    },

    /// A line total or the cart total is larger than an order can hold.
    #[error("line {line} ({name}) makes the order total too large")]
    AmountTooLarge {
        /// Zero-based line index.
        line: usize,
        /// Product name on that line.
        name: String,
    },

    /// Line index out of range.
    #[error("cart has no line {0}")]
    NoSuchLine(usize),
}

/// An extra added to a product (e.g. bacon, double cheese).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartExtra {
    pub nombre: String,
    pub precio: Price,
}

/// One product configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: MenuItemId,
    pub nombre: String,
    pub base_price: Price,
    #[serde(default)]
    pub extras: Vec<CartExtra>,
    /// Free-text removals such as "Sin cebolla".
    #[serde(default)]
    pub modifications: Vec<String>,
    /// Meat doneness, when the product allows choosing it.
    #[serde(default)]
    pub cooking: Option<String>,
    pub quantity: u32,
    /// Line total as last computed; see [`CartLine::computed_total`].
    #[serde(default)]
    pub total: Price,
}

impl CartLine {
    /// Create a line with its total already computed.
    #[must_use]
    pub fn new(
        product_id: MenuItemId,
        nombre: impl Into<String>,
        base_price: Price,
        extras: Vec<CartExtra>,
        modifications: Vec<String>,
        cooking: Option<String>,
        quantity: u32,
    ) -> Self {
        let mut line = Self {
            product_id,
            nombre: nombre.into(),
            base_price,
            extras,
            modifications,
            cooking,
            quantity,
            total: Price::ZERO,
        };
        line.total = line.computed_total();
        line
    }

    /// Price of a single unit: base price plus every extra.
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.base_price + self.extras.iter().map(|extra| extra.precio).sum::<Price>()
    }

    /// `(basePrice + Σ extras) × quantity`.
    #[must_use]
    pub fn computed_total(&self) -> Price {
        self.unit_price() * self.quantity
    }

    /// Like [`CartLine::computed_total`], but `None` if any step overflows.
    #[must_use]
    pub fn checked_total(&self) -> Option<Price> {
        self.extras
            .iter()
            .try_fold(self.base_price, |acc, extra| acc.checked_add(extra.precio))?
            .checked_mul(self.quantity)
    }

    /// Whether two lines describe the same product configuration.
    ///
    /// Extras and modifications compare as sets so the order the customer
    /// ticked them in does not matter.
    #[must_use]
    pub fn same_configuration(&self, other: &Self) -> bool {
        fn sorted<T: Clone + Ord>(items: &[T]) -> Vec<T> {
            let mut items = items.to_vec();
            items.sort();
            items
        }

        let extra_names = |line: &Self| {
            sorted(
                &line
                    .extras
                    .iter()
                    .map(|e| (e.nombre.clone(), e.precio))
                    .collect::<Vec<_>>(),
            )
        };

        self.product_id == other.product_id
            && self.base_price == other.base_price
            && self.cooking == other.cooking
            && sorted(&self.modifications) == sorted(&other.modifications)
            && extra_names(self) == extra_names(other)
    }
}

/// The customer's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add a line, merging it into an existing line with the same
    /// configuration by summing quantities.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|existing| existing.same_configuration(&line))
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
            existing.total = existing.computed_total();
        } else {
            let mut line = line;
            line.total = line.computed_total();
            self.lines.push(line);
        }
    }

    /// Change the quantity of a line. A quantity of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoSuchLine` if `index` is out of range.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(index).map(|_| ());
        }

        let line = self
            .lines
            .get_mut(index)
            .ok_or(CartError::NoSuchLine(index))?;
        line.quantity = quantity;
        line.total = line.computed_total();
        Ok(())
    }

    /// Remove a line and return it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NoSuchLine` if `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<CartLine, CartError> {
        if index >= self.lines.len() {
            return Err(CartError::NoSuchLine(index));
        }
        Ok(self.lines.remove(index))
    }

    /// Sum of every line's computed total.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::computed_total).sum()
    }

    /// Number of units across all lines (the cart badge count).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Check the cart can be turned into an order.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: empty cart, zero quantity, a
    /// negative price, or a line or cart total above [`Price::MAX_STORED`].
    pub fn validate(&self) -> Result<(), CartError> {
        if self.lines.is_empty() {
            return Err(CartError::Empty);
        }

        let mut running = Price::ZERO;
        for (line_index, line) in self.lines.iter().enumerate() {
            if line.quantity == 0 {
                return Err(CartError::ZeroQuantity {
                    line: line_index,
                    name: line.nombre.clone(),
                });
            }

            if line.base_price.is_negative() || line.extras.iter().any(|e| e.precio.is_negative())
            {
                return Err(CartError::NegativePrice {
                    line: line_index,
                    name: line.nombre.clone(),
                });
            }

            running = line
                .checked_total()
                .and_then(|total| running.checked_add(total))
                .filter(Price::fits_stored)
                .ok_or_else(|| CartError::AmountTooLarge {
                    line: line_index,
                    name: line.nombre.clone(),
                })?;
        }

        Ok(())
    }

    /// Copy of the cart with every line total recomputed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            lines: self
                .lines
                .iter()
                .cloned()
                .map(|mut line| {
                    line.total = line.computed_total();
                    line
                })
                .collect(),
        }
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }
}
