//! Checkout error types.

use apex_core::{AddressFormError, AddressId};
use thiserror::Error;

use crate::backend::BackendError;

/// Errors returned by checkout operations.
///
/// Most failures of the checkout flow are reported to the customer through
/// notices and session state instead; these are the ones the caller has to
/// handle.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The address is not among the customer's saved addresses.
    #[error("unknown address: {0}")]
    UnknownAddress(AddressId),

    /// The address form is incomplete.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressFormError),

    /// A backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}
