//! Application state shared across handlers.

use std::sync::Arc;

use apex_core::UserId;
use moka::future::Cache;

use crate::backend::{BackendClient, BackendError};
use crate::checkout::{
    CheckoutError, CheckoutSession, CheckoutSettings, Collaborators, Customer,
    HostedPaymentWidget, SessionFeed,
};
use crate::config::StorefrontConfig;

/// Upper bound on concurrently open checkouts.
const MAX_OPEN_CHECKOUTS: u64 = 10_000;

/// A customer's open checkout together with its browser-facing channels.
pub struct ActiveCheckout {
    pub session: CheckoutSession,
    pub feed: Arc<SessionFeed>,
    pub payments: Arc<HostedPaymentWidget>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and holds the backend
/// client, configuration and open checkouts.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    checkouts: Cache<UserId, Arc<ActiveCheckout>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let backend = BackendClient::new(&config.backend)?;
        let checkouts = Cache::builder()
            .max_capacity(MAX_OPEN_CHECKOUTS)
            .time_to_idle(config.checkout.session_idle)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                checkouts,
            }),
        })
    }

    /// The customer's open checkout, created and loaded on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if a new checkout cannot load the customer's
    /// addresses or cart. The checkout stays open and retries on the next
    /// call.
    pub async fn checkout_for(
        &self,
        customer: &Customer,
    ) -> Result<Arc<ActiveCheckout>, CheckoutError> {
        let active = self
            .inner
            .checkouts
            .get_with(customer.id.clone(), async { Arc::new(self.open_checkout(customer)) })
            .await;

        if !active.session.is_loaded().await {
            active.session.load().await?;
        }
        Ok(active)
    }

    /// Forget the customer's checkout so the next visit starts fresh.
    pub async fn end_checkout(&self, user: &UserId) {
        self.inner.checkouts.invalidate(user).await;
    }

    fn open_checkout(&self, customer: &Customer) -> ActiveCheckout {
        let config = &self.inner.config;
        let backend = Arc::new(self.inner.backend.clone());
        let feed = Arc::new(SessionFeed::new());
        let payments = Arc::new(HostedPaymentWidget::new(
            config.payment.key_id.clone(),
            config.payment.timeout,
        ));

        let deps = Collaborators {
            coupons: backend.clone(),
            addresses: backend.clone(),
            cart: backend.clone(),
            orders: backend,
            payments: payments.clone(),
            notifier: feed.clone(),
            navigator: feed.clone(),
        };
        let settings = CheckoutSettings {
            pricing: config.checkout.pricing,
            store_name: config.checkout.store_name.clone(),
        };

        tracing::debug!(user_id = %customer.id, "Opening checkout");
        ActiveCheckout {
            session: CheckoutSession::new(customer.clone(), settings, deps),
            feed,
            payments,
        }
    }
}
