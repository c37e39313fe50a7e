//! Apex Store Core - Checkout types and pricing.
//!
//! This crate provides the types shared by the storefront checkout:
//! - entity ids, money and currencies
//! - cart items, addresses, coupons and orders as the backend serializes them
//! - the order total and discount calculator
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Everything here is deterministic, which keeps the
//! pricing rules testable in isolation from the checkout orchestration.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids and the domain records exchanged with the backend
//! - [`pricing`] - Discount calculation and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{OrderTotals, Pricing, calculate_discount};
pub use types::*;
