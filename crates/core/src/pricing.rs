//! Order total and discount calculation.
//!
//! ```text
//! final_amount = subtotal + shipping + tax - discount      (never below zero)
//! discount     = calculate_discount(coupon, subtotal)      (0 <= discount <= subtotal)
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::types::{CartItem, Coupon, Currency, DiscountType, subtotal};

/// Discount a coupon grants on an order total.
///
/// - no coupon, or a total of zero, gives no discount
/// - percentage coupons take `value`% of the total, capped by `max_discount`
///   when the cap is positive
/// - fixed coupons take `value`, never more than the total
///
/// The result is rounded to the nearest whole unit (half away from zero) and
/// clamped to `[0, order_total]`.
///
/// # Example
///
/// ```rust
/// use apex_core::{Coupon, calculate_discount};
/// use rust_decimal::Decimal;
///
/// let save10 = Coupon::percentage("SAVE10", Decimal::from(10), None);
/// assert_eq!(calculate_discount(Some(&save10), Decimal::from(1000)), Decimal::from(100));
///
/// let flat500 = Coupon::fixed("FLAT500", Decimal::from(500));
/// assert_eq!(calculate_discount(Some(&flat500), Decimal::from(300)), Decimal::from(300));
/// ```
#[must_use]
pub fn calculate_discount(coupon: Option<&Coupon>, order_total: Decimal) -> Decimal {
    let Some(coupon) = coupon else {
        return Decimal::ZERO;
    };
    if order_total <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let discount = match coupon.discount_type {
        DiscountType::Percentage => {
            // Overflow only happens far above any order total, where the
            // clamp below wins anyway.
            let raw = order_total
                .checked_mul(coupon.discount_value)
                .map_or(order_total, |scaled| scaled / Decimal::ONE_HUNDRED);
            match coupon.max_discount {
                Some(cap) if cap > Decimal::ZERO => raw.min(cap),
                _ => raw,
            }
        }
        DiscountType::Fixed => coupon.discount_value.min(order_total),
    };

    discount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, order_total)
}

/// Flat charges added to every order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pricing {
    pub shipping: Decimal,
    pub tax: Decimal,
    pub currency: Currency,
}

impl Pricing {
    /// Create pricing constants.
    #[must_use]
    pub const fn new(shipping: Decimal, tax: Decimal, currency: Currency) -> Self {
        Self {
            shipping,
            tax,
            currency,
        }
    }
}

/// Price breakdown of a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub final_amount: Decimal,
    pub currency: Currency,
}

impl OrderTotals {
    /// Price the cart with the given constants and optional coupon.
    #[must_use]
    pub fn compute(items: &[CartItem], pricing: &Pricing, coupon: Option<&Coupon>) -> Self {
        let subtotal = subtotal(items);
        let discount = calculate_discount(coupon, subtotal);
        let final_amount = subtotal
            .saturating_add(pricing.shipping)
            .saturating_add(pricing.tax)
            .saturating_sub(discount)
            .max(Decimal::ZERO);

        Self {
            subtotal,
            shipping: pricing.shipping,
            tax: pricing.tax,
            discount,
            final_amount,
            currency: pricing.currency,
        }
    }
}
