//! Coupons issued by the coupon-validation service.
//!
//! A coupon is never built locally from user input; the storefront only
//! holds what the server returned for a validated code.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` percent of the order total, optionally capped.
    Percentage,
    /// A flat amount off. Unknown types from the server fall back here.
    #[serde(other)]
    Fixed,
}

/// A validated discount coupon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    /// Upper bound for percentage discounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<Decimal>,
}

impl Coupon {
    /// A percentage coupon.
    #[must_use]
    pub fn percentage(code: impl Into<String>, percent: Decimal, max_discount: Option<Decimal>) -> Self {
        Self {
            code: code.into(),
            discount_type: DiscountType::Percentage,
            discount_value: percent,
            max_discount,
        }
    }

    /// A fixed-amount coupon.
    #[must_use]
    pub fn fixed(code: impl Into<String>, amount: Decimal) -> Self {
        Self {
            code: code.into(),
            discount_type: DiscountType::Fixed,
            discount_value: amount,
            max_discount: None,
        }
    }
}
