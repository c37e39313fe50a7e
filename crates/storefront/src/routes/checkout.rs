//! Checkout route handlers.
//!
//! Every handler answers with the full [`CheckoutResponse`] so the browser
//! can re-render from a single payload. Notices are drained into the
//! response that follows them.

use std::sync::Arc;

use apex_core::{AddressForm, AddressId, PaymentMode};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::checkout::{
    CheckoutError, CheckoutView, Notice, PendingPaymentView, SubmitOutcome,
};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::CurrentCustomer;
use crate::state::{ActiveCheckout, AppState};

/// Everything the checkout page renders from.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    #[serde(flatten)]
    pub checkout: CheckoutView,
    /// Card payment the browser should open the widget for.
    pub pending_payment: Option<PendingPaymentView>,
    pub notices: Vec<Notice>,
    /// Where to send the customer once the order is placed.
    pub redirect: Option<String>,
    /// How the last order submission ended.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct SelectAddressBody {
    pub address_id: AddressId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentModeBody {
    pub payment_mode: PaymentMode,
}

#[derive(Debug, Deserialize)]
pub struct CouponBody {
    pub code: String,
}

/// Success callback of the payment widget.
#[derive(Debug, Deserialize)]
pub struct PaymentCallbackBody {
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: String,
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Render the checkout with `status`.
///
/// Once the response carries the order redirect the checkout is closed, so
/// the customer's next visit starts over with a fresh cart.
async fn respond(
    state: &AppState,
    active: &ActiveCheckout,
    status: StatusCode,
    outcome: Option<&'static str>,
) -> Response {
    let body = CheckoutResponse {
        checkout: active.session.view().await,
        pending_payment: active.payments.pending().await,
        notices: active.feed.drain_notices(),
        redirect: active.feed.redirect(),
        outcome,
    };

    if body.redirect.is_some() {
        state.end_checkout(&active.session.customer().id).await;
    }

    (status, Json(body)).into_response()
}

const fn outcome_status(outcome: &SubmitOutcome) -> (StatusCode, &'static str) {
    match outcome {
        SubmitOutcome::Placed(_) => (StatusCode::CREATED, "placed"),
        SubmitOutcome::MissingAddress => (StatusCode::UNPROCESSABLE_ENTITY, "missing_address"),
        SubmitOutcome::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, "empty_cart"),
        SubmitOutcome::PaymentFailed(_) => (StatusCode::PAYMENT_REQUIRED, "payment_failed"),
        SubmitOutcome::Rejected => (StatusCode::BAD_GATEWAY, "rejected"),
        SubmitOutcome::InFlight => (StatusCode::CONFLICT, "in_flight"),
        SubmitOutcome::AlreadyPlaced(_) => (StatusCode::CONFLICT, "already_placed"),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Show the checkout, loading it on first visit.
#[instrument(skip_all, fields(user_id = %customer.id))]
pub async fn show(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    Ok(respond(&state, &active, StatusCode::OK, None).await)
}

/// Select the delivery address.
#[instrument(skip_all, fields(user_id = %customer.id, address_id = %body.address_id))]
pub async fn select_address(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(body): Json<SelectAddressBody>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    active.session.select_address(&body.address_id).await?;
    Ok(respond(&state, &active, StatusCode::OK, None).await)
}

/// Add a delivery address from the address form.
#[instrument(skip_all, fields(user_id = %customer.id))]
pub async fn add_address(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(form): Json<AddressForm>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    match active.session.add_address(form).await {
        Ok(_) => Ok(respond(&state, &active, StatusCode::CREATED, None).await),
        // The alert travels with the checkout so the draft can be retried.
        Err(CheckoutError::Backend(e)) => {
            tracing::warn!(error = %e, "Address rejected by backend");
            Ok(respond(&state, &active, StatusCode::BAD_GATEWAY, None).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// Choose cash on delivery or card.
#[instrument(skip_all, fields(user_id = %customer.id, payment_mode = %body.payment_mode))]
pub async fn select_payment_mode(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(body): Json<PaymentModeBody>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    active.session.select_payment_mode(body.payment_mode).await;
    Ok(respond(&state, &active, StatusCode::OK, None).await)
}

/// Apply a coupon code.
#[instrument(skip_all, fields(user_id = %customer.id))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Json(body): Json<CouponBody>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    add_breadcrumb("checkout", "Applied coupon", Some(&[("code", body.code.as_str())]));

    let coupon = active.session.apply_coupon(&body.code).await;
    let status = if coupon.error.is_some() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::OK
    };
    Ok(respond(&state, &active, status, None).await)
}

/// Remove the applied coupon.
#[instrument(skip_all, fields(user_id = %customer.id))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    active.session.remove_coupon().await;
    Ok(respond(&state, &active, StatusCode::OK, None).await)
}

/// Submit the order.
///
/// Cash on delivery answers once the order exists. A card submission
/// answers `202 Accepted` as soon as its payment is waiting for the widget;
/// the submission keeps running and finishes when the browser reports the
/// widget's outcome.
#[instrument(skip_all, fields(user_id = %customer.id))]
pub async fn submit_order(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    add_breadcrumb("checkout", "Submitted order", None);

    let mut published = active.payments.subscribe();
    let mut submission = tokio::spawn({
        let active = Arc::clone(&active);
        async move {
            let outcome = active.session.submit_order().await;
            tracing::debug!(?outcome, "Submission finished");
            outcome
        }
    });

    tokio::select! {
        joined = &mut submission => {
            let outcome = joined.map_err(|e| AppError::Internal(format!("submission task failed: {e}")))?;
            let (status, label) = outcome_status(&outcome);
            Ok(respond(&state, &active, status, Some(label)).await)
        }
        Ok(()) = published.changed() => {
            Ok(respond(&state, &active, StatusCode::ACCEPTED, Some("awaiting_payment")).await)
        }
    }
}

/// Report the widget's success callback.
#[instrument(skip_all, fields(user_id = %customer.id, %reference))]
pub async fn complete_payment(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Path(reference): Path<Uuid>,
    Json(body): Json<PaymentCallbackBody>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    active.payments.complete(reference, body.payment_id).await?;
    Ok(respond(&state, &active, StatusCode::ACCEPTED, None).await)
}

/// Report that the customer closed the widget.
#[instrument(skip_all, fields(user_id = %customer.id, %reference))]
pub async fn dismiss_payment(
    State(state): State<AppState>,
    CurrentCustomer(customer): CurrentCustomer,
    Path(reference): Path<Uuid>,
) -> Result<Response> {
    let active = state.checkout_for(&customer).await?;
    active.payments.dismiss(reference).await?;
    Ok(respond(&state, &active, StatusCode::OK, None).await)
}
