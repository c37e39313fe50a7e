//! Checkout orchestration.
//!
//! # Components
//!
//! - [`CheckoutSession`] - one customer's checkout: address and payment
//!   selection, coupon application, order submission
//! - [`ports`] - the collaborator traits a session is built from
//! - [`HostedPaymentWidget`] - card payments collected by the browser widget
//! - [`SessionFeed`] - notices and redirects buffered for HTTP responses
//!
//! # Flow
//!
//! ```text
//! load ─► select address ─► select payment mode ─► apply coupon ─► submit
//!                                                                   │
//!                        COD ─────────────────────────► create order ┤
//!                        CARD ─► collect payment ─► create order ────┤
//!                                                                   ▼
//!                                          reset cart + /order-success/{id}
//! ```

mod error;
mod feed;
mod payment;
pub mod ports;
mod session;

#[cfg(test)]
mod fakes;

pub use error::CheckoutError;
pub use feed::SessionFeed;
pub use payment::{
    HostedPaymentWidget, PaymentError, PaymentReceipt, PaymentRequest, PendingPaymentView, Prefill,
};
pub use ports::{Collaborators, Notice, NoticeLevel};
pub use session::{
    CheckoutSession, CheckoutSettings, CheckoutView, CouponState, Customer, SubmitOutcome,
};
