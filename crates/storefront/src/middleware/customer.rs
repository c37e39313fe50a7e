//! Customer identification.
//!
//! The storefront sits behind the site's login gateway, which forwards the
//! signed-in customer as request headers. Handlers that need a customer take
//! a [`CurrentCustomer`] argument.

use apex_core::UserId;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::checkout::Customer;
use crate::error::{AppError, set_sentry_user};

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const CUSTOMER_NAME_HEADER: &str = "x-customer-name";
pub const CUSTOMER_EMAIL_HEADER: &str = "x-customer-email";

/// Extractor that requires an identified customer.
///
/// Rejects with `401 Unauthorized` when `x-customer-id` is missing or blank.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentCustomer(customer): CurrentCustomer) -> String {
///     customer.id.to_string()
/// }
/// ```
pub struct CurrentCustomer(pub Customer);

impl<S> FromRequestParts<S> for CurrentCustomer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(String::from)
        };

        let id = header(CUSTOMER_ID_HEADER)
            .map(UserId::new)
            .ok_or_else(|| AppError::Unauthorized("customer not identified".to_string()))?;
        let customer = Customer {
            id,
            name: header(CUSTOMER_NAME_HEADER),
            email: header(CUSTOMER_EMAIL_HEADER),
        };

        set_sentry_user(&customer.id, customer.email.as_deref());
        tracing::Span::current().record("user_id", tracing::field::display(&customer.id));

        Ok(Self(customer))
    }
}
