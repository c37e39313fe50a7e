//! Card payments through the hosted payment widget.
//!
//! The widget runs in the customer's browser. A card submission parks in
//! [`HostedPaymentWidget::collect`] until the browser reports the widget's
//! callback through [`HostedPaymentWidget::complete`] (or
//! [`HostedPaymentWidget::dismiss`]), which wakes it over a oneshot channel.
//!
//! ```text
//! submit_order ──collect()──► pending payment published ──► browser opens widget
//!      ▲                                                         │
//!      └──── oneshot ◄── complete(reference, payment_id) ◄───────┘
//! ```

use std::time::Duration;

use apex_core::Currency;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{Mutex, oneshot, watch};
use uuid::Uuid;

use super::ports::PaymentGateway;

/// Errors from collecting a card payment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// The customer closed the widget, or a newer payment replaced this one.
    #[error("payment was dismissed")]
    Dismissed,
    /// The widget reported a failed charge.
    #[error("payment failed: {0}")]
    Failed(String),
    /// No outcome arrived in time.
    #[error("payment timed out")]
    TimedOut,
    /// The reference does not match the pending payment.
    #[error("no pending payment with reference {0}")]
    UnknownReference(Uuid),
}

/// Contact details prefilled in the widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// What the widget is asked to charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// Amount in the smallest currency subunit (paise for INR).
    pub amount: i64,
    pub currency: Currency,
    /// Merchant name shown in the widget.
    pub name: String,
    pub description: String,
    pub prefill: Prefill,
}

/// Proof of a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Transaction id issued by the payment processor.
    pub payment_id: String,
}

/// A parked payment as the browser needs it to open the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingPaymentView {
    pub reference: Uuid,
    /// Publishable widget key.
    pub key: String,
    #[serde(flatten)]
    pub request: PaymentRequest,
}

struct PendingPayment {
    reference: Uuid,
    request: PaymentRequest,
    outcome: oneshot::Sender<Result<PaymentReceipt, PaymentError>>,
}

/// Payment gateway that hands the charge to the browser-side widget.
///
/// Holds at most one pending payment; starting another dismisses the first.
pub struct HostedPaymentWidget {
    key_id: String,
    timeout: Duration,
    pending: Mutex<Option<PendingPayment>>,
    published: watch::Sender<Option<Uuid>>,
}

impl HostedPaymentWidget {
    /// Create a widget bridge for one checkout.
    #[must_use]
    pub fn new(key_id: impl Into<String>, timeout: Duration) -> Self {
        let (published, _) = watch::channel(None);
        Self {
            key_id: key_id.into(),
            timeout,
            pending: Mutex::new(None),
            published,
        }
    }

    /// The payment waiting for the browser, if any.
    pub async fn pending(&self) -> Option<PendingPaymentView> {
        self.pending
            .lock()
            .await
            .as_ref()
            .map(|pending| PendingPaymentView {
                reference: pending.reference,
                key: self.key_id.clone(),
                request: pending.request.clone(),
            })
    }

    /// Watch for newly published payments.
    ///
    /// Subscribe before starting a submission; `changed()` then fires when
    /// that submission parks its payment.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Uuid>> {
        self.published.subscribe()
    }

    /// Report the widget's success callback.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::UnknownReference`] if no payment with this
    /// reference is pending.
    pub async fn complete(&self, reference: Uuid, payment_id: String) -> Result<(), PaymentError> {
        let outcome = if payment_id.trim().is_empty() {
            Err(PaymentError::Failed("missing payment id".to_string()))
        } else {
            Ok(PaymentReceipt { payment_id })
        };
        self.resolve(reference, outcome).await
    }

    /// Report that the customer closed the widget.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::UnknownReference`] if no payment with this
    /// reference is pending.
    pub async fn dismiss(&self, reference: Uuid) -> Result<(), PaymentError> {
        self.resolve(reference, Err(PaymentError::Dismissed)).await
    }

    async fn resolve(
        &self,
        reference: Uuid,
        outcome: Result<PaymentReceipt, PaymentError>,
    ) -> Result<(), PaymentError> {
        let pending = {
            let mut slot = self.pending.lock().await;
            if slot.as_ref().is_some_and(|p| p.reference == reference) {
                slot.take()
            } else {
                None
            }
        };

        let pending = pending.ok_or(PaymentError::UnknownReference(reference))?;
        // The collecting side may have timed out in the meantime.
        if pending.outcome.send(outcome).is_err() {
            tracing::debug!(%reference, "payment outcome arrived after collector gave up");
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for HostedPaymentWidget {
    async fn collect(&self, request: PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        let reference = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();

        tracing::info!(
            %reference,
            amount = request.amount,
            currency = %request.currency,
            "Awaiting card payment"
        );

        {
            let mut slot = self.pending.lock().await;
            let previous = slot.replace(PendingPayment {
                reference,
                request,
                outcome: tx,
            });
            if let Some(previous) = previous {
                let _ = previous.outcome.send(Err(PaymentError::Dismissed));
            }
        }
        self.published.send_replace(Some(reference));

        let outcome = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(PaymentError::Dismissed),
            Err(_) => Err(PaymentError::TimedOut),
        };

        let mut slot = self.pending.lock().await;
        if slot.as_ref().is_some_and(|p| p.reference == reference) {
            slot.take();
        }

        outcome
    }
}
