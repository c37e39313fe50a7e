//! Core types for Apex Store checkout.
//!
//! Field names follow the backend's JSON (camelCase, `_id` for ids) so the
//! same types serve both the HTTP client and the storefront API.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod id;
pub mod money;
pub mod order;

pub use address::{Address, AddressForm, AddressFormError, NewAddress};
pub use cart::{CartItem, Product, subtotal};
pub use coupon::{Coupon, DiscountType};
pub use id::*;
pub use money::{Currency, CurrencyError, format_whole_amount};
pub use order::{NewOrder, Order, PaymentMode};
