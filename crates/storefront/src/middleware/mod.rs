//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors, bind a hub per request)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Customer identification is an extractor rather than a layer so that
//! `/health` stays anonymous.

pub mod customer;
pub mod request_id;

pub use customer::CurrentCustomer;
pub use request_id::request_id_middleware;
