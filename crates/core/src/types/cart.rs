//! Cart lines as read from the cart service.
//!
//! The checkout never edits the cart; it reads the lines to price the order
//! and copies them into the order record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CartItemId, ProductId};

/// The product snapshot embedded in a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    /// Unit price in the store currency.
    pub price: Decimal,
    #[serde(default)]
    pub images: Vec<String>,
}

/// A single line in the customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CartItemId>,
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Unit price times quantity, saturating at the `Decimal` bounds.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.saturating_mul(Decimal::from(self.quantity))
    }
}

/// Sum of all line totals, before shipping, tax and discount.
///
/// Saturates instead of overflowing; a saturated amount cannot be charged
/// (see [`Currency::minor_units`](crate::Currency::minor_units)).
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items
        .iter()
        .fold(Decimal::ZERO, |total, item| total.saturating_add(item.line_total()))
}
