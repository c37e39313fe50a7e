//! A single customer's checkout.
//!
//! All mutable state lives behind one async mutex that is never held across
//! a collaborator call. Remote calls work on a snapshot and re-lock to apply
//! their result, so a slow backend never blocks the customer's other
//! actions.

use apex_core::{
    Address, AddressForm, AddressId, CartItem, Coupon, NewOrder, Order, OrderId, OrderTotals,
    PaymentMode, Pricing, UserId, calculate_discount, format_whole_amount, subtotal,
};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use super::error::CheckoutError;
use super::payment::{PaymentError, PaymentReceipt, PaymentRequest, Prefill};
use super::ports::{Collaborators, CouponValidation, Notice};
use crate::backend::BackendError;

const MISSING_ADDRESS: &str = "Please select a delivery address";
const EMPTY_CART: &str = "Your cart is empty";
const EMPTY_COUPON_CODE: &str = "Enter a coupon code";
const INVALID_COUPON: &str = "Invalid coupon";
const ADDRESS_REJECTED: &str = "Error adding your address";
const ORDER_REJECTED: &str = "Could not place your order. Please try again.";
const PAYMENT_INCOMPLETE: &str = "Payment was not completed";
const PAYMENT_SUCCEEDED: &str = "Payment Successful!";
const PAYMENT_DESCRIPTION: &str = "Order Payment";

/// The logged-in customer checking out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: UserId,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Store-wide settings a checkout prices and labels with.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub pricing: Pricing,
    /// Merchant name shown in the payment widget.
    pub store_name: String,
}

/// Coupon part of the checkout state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponState {
    pub applied_coupon: Option<Coupon>,
    pub error: Option<String>,
}

/// Result of [`CheckoutSession::submit_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The order service created the order.
    Placed(Order),
    /// No delivery address selected; nothing was sent.
    MissingAddress,
    /// The cart has no lines; nothing was sent.
    EmptyCart,
    /// The card payment did not go through; no order was created.
    PaymentFailed(PaymentError),
    /// The order service rejected the order or could not be reached.
    Rejected,
    /// Another submission of this checkout is still running.
    InFlight,
    /// This checkout already produced an order.
    AlreadyPlaced(OrderId),
}

/// Snapshot of a checkout for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutView {
    pub customer_id: UserId,
    pub items: Vec<CartItem>,
    pub addresses: Vec<Address>,
    pub selected_address: Option<AddressId>,
    pub payment_mode: PaymentMode,
    pub coupon_code: String,
    pub applied_coupon: Option<Coupon>,
    pub coupon_error: Option<String>,
    pub totals: OrderTotals,
    pub address_draft: AddressForm,
    pub submitting: bool,
    pub current_order: Option<Order>,
}

#[derive(Debug, Default)]
struct CheckoutState {
    loaded: bool,
    items: Vec<CartItem>,
    addresses: Vec<Address>,
    selected_address: Option<AddressId>,
    payment_mode: PaymentMode,
    coupon_code: String,
    applied_coupon: Option<Coupon>,
    coupon_error: Option<String>,
    /// Latest coupon application; responses for older tickets are dropped.
    coupon_ticket: u64,
    address_draft: AddressForm,
    submitting: bool,
    current_order: Option<Order>,
    /// Order whose completion effects already ran.
    completed_order: Option<OrderId>,
}

impl CheckoutState {
    fn selected(&self) -> Option<&Address> {
        let id = self.selected_address.as_ref()?;
        self.addresses.iter().find(|address| &address.id == id)
    }

    fn coupon_state(&self) -> CouponState {
        CouponState {
            applied_coupon: self.applied_coupon.clone(),
            error: self.coupon_error.clone(),
        }
    }
}

/// What a submission works on, captured when it starts.
struct Submission {
    address: Address,
    items: Vec<CartItem>,
    payment_mode: PaymentMode,
    totals: OrderTotals,
}

/// One customer's checkout.
pub struct CheckoutSession {
    customer: Customer,
    settings: CheckoutSettings,
    deps: Collaborators,
    state: Mutex<CheckoutState>,
}

impl CheckoutSession {
    /// Create an empty checkout. Call [`load`](Self::load) before use.
    #[must_use]
    pub fn new(customer: Customer, settings: CheckoutSettings, deps: Collaborators) -> Self {
        Self {
            customer,
            settings,
            deps,
            state: Mutex::new(CheckoutState::default()),
        }
    }

    #[must_use]
    pub const fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Whether [`load`](Self::load) has completed at least once.
    pub async fn is_loaded(&self) -> bool {
        self.state.lock().await.loaded
    }

    /// Fetch the customer's addresses and cart.
    ///
    /// Keeps the current address selection if it still exists, otherwise
    /// selects the first address.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Backend`] if either fetch fails; the state is
    /// left untouched in that case.
    #[instrument(skip(self), fields(user_id = %self.customer.id))]
    pub async fn load(&self) -> Result<(), CheckoutError> {
        let (addresses, items) = tokio::try_join!(
            self.deps.addresses.list_addresses(&self.customer.id),
            self.deps.cart.cart_items(&self.customer.id),
        )?;

        let mut state = self.state.lock().await;
        let keep_selection = state
            .selected_address
            .as_ref()
            .is_some_and(|id| addresses.iter().any(|address| &address.id == id));
        if !keep_selection {
            state.selected_address = addresses.first().map(|address| address.id.clone());
        }

        tracing::debug!(
            addresses = addresses.len(),
            items = items.len(),
            "Checkout loaded"
        );
        state.addresses = addresses;
        state.items = items;
        state.loaded = true;
        Ok(())
    }

    /// Select a delivery address among the loaded ones.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownAddress`] if the id is not in the list.
    pub async fn select_address(&self, id: &AddressId) -> Result<(), CheckoutError> {
        let mut state = self.state.lock().await;
        if !state.addresses.iter().any(|address| &address.id == id) {
            return Err(CheckoutError::UnknownAddress(id.clone()));
        }
        state.selected_address = Some(id.clone());
        Ok(())
    }

    /// Choose how the order will be paid.
    pub async fn select_payment_mode(&self, mode: PaymentMode) {
        self.state.lock().await.payment_mode = mode;
    }

    /// Save a new address from the address form.
    ///
    /// On success the address joins the list (and is selected if nothing
    /// was) and the form draft is cleared. A rejection raises a blocking
    /// alert and keeps the draft.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidAddress`] without any network call if
    /// a field is blank, or [`CheckoutError::Backend`] if the store rejects it.
    #[instrument(skip(self, form), fields(user_id = %self.customer.id))]
    pub async fn add_address(&self, form: AddressForm) -> Result<Address, CheckoutError> {
        self.state.lock().await.address_draft = form.clone();
        let new_address = form.validate(&self.customer.id)?;

        match self.deps.addresses.add_address(&new_address).await {
            Ok(address) => {
                let mut state = self.state.lock().await;
                state.address_draft = AddressForm::default();
                if state.selected().is_none() {
                    state.selected_address = Some(address.id.clone());
                }
                state.addresses.push(address.clone());
                tracing::info!(address_id = %address.id, "Address added");
                Ok(address)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to add address");
                self.deps.notifier.notify(Notice::alert(ADDRESS_REJECTED));
                Err(e.into())
            }
        }
    }

    /// Validate a coupon code against the cart subtotal and apply it.
    ///
    /// The code is trimmed and upper-cased. Any failure clears the applied
    /// coupon and records an error. If the customer applies another code
    /// (or removes the coupon) before the response arrives, the response is
    /// discarded.
    #[instrument(skip(self), fields(user_id = %self.customer.id))]
    pub async fn apply_coupon(&self, code: &str) -> CouponState {
        let code = code.trim().to_uppercase();

        let (ticket, cart_total) = {
            let mut state = self.state.lock().await;
            state.coupon_code.clone_from(&code);
            state.coupon_ticket += 1;
            if code.is_empty() {
                state.applied_coupon = None;
                state.coupon_error = Some(EMPTY_COUPON_CODE.to_string());
                return state.coupon_state();
            }
            state.coupon_error = None;
            (state.coupon_ticket, subtotal(&state.items))
        };

        let result = self.deps.coupons.validate(&code, cart_total).await;

        let mut state = self.state.lock().await;
        if state.coupon_ticket != ticket {
            tracing::debug!(code = %code, ticket, "Discarding superseded coupon response");
            return state.coupon_state();
        }

        match result {
            Ok(CouponValidation {
                valid: true,
                coupon: Some(coupon),
            }) => {
                let discount = calculate_discount(Some(&coupon), subtotal(&state.items));
                tracing::info!(code = %code, %discount, "Coupon applied");
                self.deps.notifier.notify(Notice::success(format!(
                    "Coupon applied! You saved {}",
                    format_whole_amount(discount, self.settings.pricing.currency)
                )));
                state.applied_coupon = Some(coupon);
                state.coupon_error = None;
            }
            Ok(_) => {
                tracing::debug!(code = %code, "Coupon rejected");
                state.applied_coupon = None;
                state.coupon_error = Some(INVALID_COUPON.to_string());
            }
            Err(e) => {
                tracing::warn!(error = %e, code = %code, "Coupon validation failed");
                state.applied_coupon = None;
                state.coupon_error = Some(coupon_failure_message(&e).to_string());
            }
        }

        state.coupon_state()
    }

    /// Drop the applied coupon and any coupon error.
    ///
    /// An application still in flight is discarded when it returns.
    pub async fn remove_coupon(&self) -> CouponState {
        let mut state = self.state.lock().await;
        state.coupon_ticket += 1;
        state.coupon_code.clear();
        state.applied_coupon = None;
        state.coupon_error = None;
        state.coupon_state()
    }

    /// Place the order.
    ///
    /// Without a selected address (or with an empty cart) the customer gets
    /// one error notice and nothing is sent. Cash on delivery creates the
    /// order right away; card payments create it only after the payment
    /// gateway confirms the charge, carrying its transaction id.
    #[instrument(skip(self), fields(user_id = %self.customer.id))]
    pub async fn submit_order(&self) -> SubmitOutcome {
        let submission = {
            let mut state = self.state.lock().await;
            if let Some(order_id) = &state.completed_order {
                return SubmitOutcome::AlreadyPlaced(order_id.clone());
            }
            if state.submitting {
                return SubmitOutcome::InFlight;
            }
            let Some(address) = state.selected().cloned() else {
                self.deps.notifier.notify(Notice::error(MISSING_ADDRESS));
                return SubmitOutcome::MissingAddress;
            };
            if state.items.is_empty() {
                self.deps.notifier.notify(Notice::error(EMPTY_CART));
                return SubmitOutcome::EmptyCart;
            }

            state.submitting = true;
            Submission {
                address,
                totals: OrderTotals::compute(
                    &state.items,
                    &self.settings.pricing,
                    state.applied_coupon.as_ref(),
                ),
                items: state.items.clone(),
                payment_mode: state.payment_mode,
            }
        };

        let outcome = self.place(submission).await;
        self.state.lock().await.submitting = false;
        outcome
    }

    async fn place(&self, submission: Submission) -> SubmitOutcome {
        let payment_id = match submission.payment_mode {
            PaymentMode::CashOnDelivery => None,
            PaymentMode::Card => match self.collect_payment(&submission).await {
                Ok(receipt) => {
                    self.deps.notifier.notify(Notice::success(PAYMENT_SUCCEEDED));
                    Some(receipt.payment_id)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Card payment not completed");
                    self.deps.notifier.notify(Notice::error(PAYMENT_INCOMPLETE));
                    return SubmitOutcome::PaymentFailed(e);
                }
            },
        };

        let order = NewOrder {
            user: self.customer.id.clone(),
            items: submission.items,
            address: submission.address,
            payment_mode: submission.payment_mode,
            total: submission.totals.final_amount,
            payment_id,
        };

        match self.deps.orders.create_order(&order).await {
            Ok(created) => {
                tracing::info!(
                    order_id = %created.id,
                    payment_mode = %order.payment_mode,
                    total = %order.total,
                    "Order placed"
                );
                self.observe_order(created.clone()).await;
                SubmitOutcome::Placed(created)
            }
            Err(e) => {
                tracing::error!(error = %e, "Order creation failed");
                self.deps.notifier.notify(Notice::error(ORDER_REJECTED));
                SubmitOutcome::Rejected
            }
        }
    }

    async fn collect_payment(
        &self,
        submission: &Submission,
    ) -> Result<PaymentReceipt, PaymentError> {
        let currency = self.settings.pricing.currency;
        let amount = currency
            .minor_units(submission.totals.final_amount)
            .map_err(|e| PaymentError::Failed(e.to_string()))?;

        let request = PaymentRequest {
            amount,
            currency,
            name: self.settings.store_name.clone(),
            description: PAYMENT_DESCRIPTION.to_string(),
            prefill: Prefill {
                name: self.customer.name.clone().unwrap_or_default(),
                email: self.customer.email.clone().unwrap_or_default(),
                contact: submission.address.phone_number.clone(),
            },
        };

        self.deps.payments.collect(request).await
    }

    /// Record the current order and run the completion effects.
    ///
    /// The first time an order with a non-empty id is seen, the customer's
    /// cart is reset and the customer is sent to the order confirmation.
    /// Returns whether the effects ran.
    pub async fn observe_order(&self, order: Order) -> bool {
        if order.id.is_empty() {
            return false;
        }

        {
            let mut state = self.state.lock().await;
            state.current_order = Some(order.clone());
            if state.completed_order.as_ref() == Some(&order.id) {
                return false;
            }
            state.completed_order = Some(order.id.clone());
        }

        match self.deps.cart.reset_cart(&self.customer.id).await {
            Ok(()) => self.state.lock().await.items.clear(),
            Err(e) => tracing::warn!(error = %e, order_id = %order.id, "Failed to reset cart"),
        }
        self.deps
            .navigator
            .navigate(format!("/order-success/{}", order.id));
        true
    }

    /// Snapshot of the checkout.
    pub async fn view(&self) -> CheckoutView {
        let state = self.state.lock().await;
        CheckoutView {
            customer_id: self.customer.id.clone(),
            totals: OrderTotals::compute(
                &state.items,
                &self.settings.pricing,
                state.applied_coupon.as_ref(),
            ),
            items: state.items.clone(),
            addresses: state.addresses.clone(),
            selected_address: state.selected_address.clone(),
            payment_mode: state.payment_mode,
            coupon_code: state.coupon_code.clone(),
            applied_coupon: state.applied_coupon.clone(),
            coupon_error: state.coupon_error.clone(),
            address_draft: state.address_draft.clone(),
            submitting: state.submitting,
            current_order: state.current_order.clone(),
        }
    }
}

/// Message for a coupon validation that never produced a verdict.
const fn coupon_failure_message(error: &BackendError) -> &'static str {
    match error {
        BackendError::Api { .. } => "Coupon validation failed",
        BackendError::Http(_) => "Could not reach the coupon service",
        BackendError::Parse(_) | BackendError::InvalidToken(_) | BackendError::InvalidUrl(_) => {
            INVALID_COUPON
        }
    }
}
