use std::sync::Arc;

use apex_core::{Address, CartItem, NewAddress, NewOrder, Order, UserId};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::BackendError;
use crate::checkout::ports::{
    AddressStore, CartStore, CouponValidation, CouponValidator, OrderService,
};
use crate::config::BackendConfig;

/// How much of an error body is kept for logs and error messages.
const ERROR_SNIPPET_CHARS: usize = 500;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ValidateCouponBody<'a> {
    code: &'a str,
    cart_total: Decimal,
}

/// Client for the backend REST API.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the API token is not a valid header value or the
    /// HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &config.api_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client,
                base_url: config.api_url.clone(),
            }),
        })
    }

    /// Base URL with `segments` appended as escaped path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::InvalidUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the body of a successful response.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let snippet = body.chars().take(ERROR_SNIPPET_CHARS).collect::<String>();
            tracing::error!(
                status = %status,
                body = %snippet,
                "Backend returned non-success status"
            );
            return Err(BackendError::Api {
                status: status.as_u16(),
                message: snippet,
            });
        }

        Ok(body)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BackendError> {
        let body = self.execute(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse backend response");
            BackendError::Parse(e)
        })
    }
}

#[async_trait]
impl CouponValidator for BackendClient {
    #[instrument(skip(self))]
    async fn validate(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponValidation, BackendError> {
        let url = self.endpoint(&["coupons", "validate"])?;
        let body = ValidateCouponBody { code, cart_total };
        self.fetch(self.inner.client.post(url).json(&body)).await
    }
}

#[async_trait]
impl AddressStore for BackendClient {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn list_addresses(&self, user: &UserId) -> Result<Vec<Address>, BackendError> {
        let url = self.endpoint(&["address", "user", user.as_str()])?;
        self.fetch(self.inner.client.get(url)).await
    }

    #[instrument(skip(self, address), fields(user_id = %address.user))]
    async fn add_address(&self, address: &NewAddress) -> Result<Address, BackendError> {
        let url = self.endpoint(&["address"])?;
        self.fetch(self.inner.client.post(url).json(address)).await
    }
}

#[async_trait]
impl CartStore for BackendClient {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn cart_items(&self, user: &UserId) -> Result<Vec<CartItem>, BackendError> {
        let url = self.endpoint(&["cart", "user", user.as_str()])?;
        self.fetch(self.inner.client.get(url)).await
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn reset_cart(&self, user: &UserId) -> Result<(), BackendError> {
        let url = self.endpoint(&["cart", "user", user.as_str()])?;
        self.execute(self.inner.client.delete(url)).await?;
        Ok(())
    }
}

#[async_trait]
impl OrderService for BackendClient {
    #[instrument(skip(self, order), fields(user_id = %order.user, payment_mode = %order.payment_mode))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        let url = self.endpoint(&["orders"])?;
        self.fetch(self.inner.client.post(url).json(order)).await
    }
}
