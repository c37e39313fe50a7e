//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Health check
//!
//! # Checkout (customer from x-customer-id)
//! GET    /checkout                      - Load and show the checkout
//! PUT    /checkout/address              - Select delivery address
//! POST   /checkout/addresses            - Add delivery address
//! PUT    /checkout/payment-mode         - Select COD or CARD
//! POST   /checkout/coupon               - Apply coupon
//! DELETE /checkout/coupon               - Remove coupon
//! POST   /checkout/order                - Submit order
//! POST   /checkout/payment/{reference}  - Payment widget success callback
//! DELETE /checkout/payment/{reference}  - Payment widget dismissed
//! ```

pub mod checkout;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", put(checkout::select_address))
        .route("/addresses", post(checkout::add_address))
        .route("/payment-mode", put(checkout::select_payment_mode))
        .route(
            "/coupon",
            post(checkout::apply_coupon).delete(checkout::remove_coupon),
        )
        .route("/order", post(checkout::submit_order))
        .route(
            "/payment/{reference}",
            post(checkout::complete_payment).delete(checkout::dismiss_payment),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/checkout", checkout_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}
