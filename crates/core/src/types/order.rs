//! Orders and payment modes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::address::Address;
use super::cart::CartItem;
use super::id::{OrderId, UserId};

/// How the customer pays for the order.
///
/// A closed set: adding a mode means handling it everywhere it is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentMode {
    /// Cash on delivery. The order is created immediately.
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
    /// Card payment through the hosted payment widget. The order is created
    /// only after the widget reports a successful charge.
    #[serde(rename = "CARD")]
    Card,
}

impl PaymentMode {
    /// Wire name ("COD" or "CARD").
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "COD",
            Self::Card => "CARD",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "COD" | "CASH" => Ok(Self::CashOnDelivery),
            "CARD" => Ok(Self::Card),
            _ => Err(format!("invalid payment mode: {s}")),
        }
    }
}

/// An order as submitted to the order service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user: UserId,
    /// The order service names the line list `item`.
    #[serde(rename = "item")]
    pub items: Vec<CartItem>,
    pub address: Address,
    pub payment_mode: PaymentMode,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
}

/// An order as returned by the order service after creation.
///
/// Only the fields the checkout needs are kept; the service may return more.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: OrderId,
    #[serde(default)]
    pub payment_mode: Option<PaymentMode>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
