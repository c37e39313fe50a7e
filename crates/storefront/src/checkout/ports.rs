//! Collaborators the checkout talks to.
//!
//! Each trait is a narrow capability handed to [`CheckoutSession`] at
//! construction, so nothing in the checkout reaches for ambient state. The
//! production implementations are [`BackendClient`], [`HostedPaymentWidget`]
//! and [`SessionFeed`]; tests substitute recording fakes.
//!
//! [`CheckoutSession`]: super::CheckoutSession
//! [`BackendClient`]: crate::backend::BackendClient
//! [`HostedPaymentWidget`]: super::HostedPaymentWidget
//! [`SessionFeed`]: super::SessionFeed

use std::sync::Arc;

use apex_core::{Address, CartItem, Coupon, NewAddress, NewOrder, Order, UserId};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::payment::{PaymentError, PaymentReceipt, PaymentRequest};
use crate::backend::BackendError;

/// Response of the coupon-validation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponValidation {
    pub valid: bool,
    #[serde(default)]
    pub coupon: Option<Coupon>,
}

/// Validates coupon codes against the current cart total.
#[async_trait]
pub trait CouponValidator: Send + Sync {
    async fn validate(&self, code: &str, cart_total: Decimal)
    -> Result<CouponValidation, BackendError>;
}

/// The customer's saved addresses.
#[async_trait]
pub trait AddressStore: Send + Sync {
    async fn list_addresses(&self, user: &UserId) -> Result<Vec<Address>, BackendError>;

    async fn add_address(&self, address: &NewAddress) -> Result<Address, BackendError>;
}

/// The customer's active cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn cart_items(&self, user: &UserId) -> Result<Vec<CartItem>, BackendError>;

    /// Empty the cart once its contents became an order.
    async fn reset_cart(&self, user: &UserId) -> Result<(), BackendError>;
}

/// Creates orders.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError>;
}

/// Collects a card payment.
///
/// Resolves only once the payment widget reports an outcome, which is what
/// lets the checkout sequence order creation strictly after the charge.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn collect(&self, request: PaymentRequest) -> Result<PaymentReceipt, PaymentError>;
}

/// Severity of a message shown to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    /// Transient success toast.
    Success,
    /// Transient error toast.
    Error,
    /// Blocking alert the customer has to dismiss.
    Alert,
}

/// A message for the customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
        }
    }
}

/// Surfaces notices to the customer.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Moves the customer to another view.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: String);
}

/// Everything a checkout session depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub coupons: Arc<dyn CouponValidator>,
    pub addresses: Arc<dyn AddressStore>,
    pub cart: Arc<dyn CartStore>,
    pub orders: Arc<dyn OrderService>,
    pub payments: Arc<dyn PaymentGateway>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}
