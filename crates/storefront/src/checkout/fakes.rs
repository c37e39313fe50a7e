//! Recording fakes for checkout tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use apex_core::{
    Address, AddressId, CartItem, Coupon, NewAddress, NewOrder, Order, OrderId, Product,
    ProductId, UserId,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::{oneshot, watch};

use super::payment::{PaymentError, PaymentReceipt, PaymentRequest};
use super::ports::{
    AddressStore, CartStore, CouponValidation, CouponValidator, OrderService, PaymentGateway,
};
use crate::backend::BackendError;

type Journal = Arc<Mutex<Vec<String>>>;

pub fn address(id: &str) -> Address {
    Address {
        id: AddressId::new(id),
        kind: "Home".to_string(),
        street: format!("{id} MG Road"),
        city: "Pune".to_string(),
        state: "MH".to_string(),
        country: "India".to_string(),
        postal_code: "411001".to_string(),
        phone_number: "9876543210".to_string(),
        user: UserId::new("u1"),
    }
}

pub fn cart_item(product_id: &str, price: Decimal, quantity: u32) -> CartItem {
    CartItem {
        id: None,
        product: Product {
            id: ProductId::new(product_id),
            title: format!("Product {product_id}"),
            price,
            images: vec![],
        },
        quantity,
    }
}

fn rejected(status: u16) -> BackendError {
    BackendError::Api {
        status,
        message: "rejected by fake".to_string(),
    }
}

/// Scripted coupon-service reply.
#[derive(Debug, Clone)]
pub enum CouponReply {
    Valid(Coupon),
    Invalid,
    Status(u16),
}

/// Scripted order-service reply.
#[derive(Debug, Clone)]
pub enum OrderReply {
    /// Create the order with this id.
    Created(String),
    /// Create orders with ids `o1`, `o2`, ...
    Numbered,
    Rejected,
}

pub struct FakeBackend {
    addresses: Vec<Address>,
    items: Vec<CartItem>,
    coupons: HashMap<String, CouponReply>,
    coupon_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    reject_addresses: bool,
    order_reply: OrderReply,

    network_calls: Mutex<usize>,
    coupon_requests: Mutex<Vec<(String, Decimal)>>,
    coupon_seen: watch::Sender<usize>,
    added: Mutex<Vec<NewAddress>>,
    orders: Mutex<Vec<NewOrder>>,
    cart_resets: Mutex<usize>,
    journal: Journal,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            addresses: vec![],
            items: vec![],
            coupons: HashMap::new(),
            coupon_gates: Mutex::new(HashMap::new()),
            reject_addresses: false,
            order_reply: OrderReply::Numbered,
            network_calls: Mutex::new(0),
            coupon_requests: Mutex::new(vec![]),
            coupon_seen: watch::channel(0).0,
            added: Mutex::new(vec![]),
            orders: Mutex::new(vec![]),
            cart_resets: Mutex::new(0),
            journal: Arc::default(),
        }
    }

    pub fn with_addresses(mut self, addresses: Vec<Address>) -> Self {
        self.addresses = addresses;
        self
    }

    pub fn with_items(mut self, items: Vec<CartItem>) -> Self {
        self.items = items;
        self
    }

    pub fn with_coupon(mut self, code: &str, reply: CouponReply) -> Self {
        self.coupons.insert(code.to_string(), reply);
        self
    }

    /// Hold the reply for `code` until the returned sender fires.
    pub fn gate_coupon(self, code: &str) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        self.coupon_gates
            .lock()
            .unwrap()
            .insert(code.to_string(), rx);
        (self, tx)
    }

    pub const fn rejecting_addresses(mut self) -> Self {
        self.reject_addresses = true;
        self
    }

    pub fn with_order_reply(mut self, reply: OrderReply) -> Self {
        self.order_reply = reply;
        self
    }

    pub fn network_calls(&self) -> usize {
        *self.network_calls.lock().unwrap()
    }

    pub fn coupon_requests(&self) -> Vec<(String, Decimal)> {
        self.coupon_requests.lock().unwrap().clone()
    }

    pub async fn wait_for_coupon_requests(&self, count: usize) {
        let mut rx = self.coupon_seen.subscribe();
        rx.wait_for(|seen| *seen >= count).await.unwrap();
    }

    pub fn added_addresses(&self) -> Vec<NewAddress> {
        self.added.lock().unwrap().clone()
    }

    pub fn created_orders(&self) -> Vec<NewOrder> {
        self.orders.lock().unwrap().clone()
    }

    pub fn cart_resets(&self) -> usize {
        *self.cart_resets.lock().unwrap()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    fn record_call(&self) {
        *self.network_calls.lock().unwrap() += 1;
    }

    fn log(&self, entry: &str) {
        self.journal.lock().unwrap().push(entry.to_string());
    }
}

#[async_trait]
impl CouponValidator for FakeBackend {
    async fn validate(
        &self,
        code: &str,
        cart_total: Decimal,
    ) -> Result<CouponValidation, BackendError> {
        self.record_call();
        self.coupon_requests
            .lock()
            .unwrap()
            .push((code.to_string(), cart_total));
        self.coupon_seen.send_modify(|seen| *seen += 1);

        let gate = self.coupon_gates.lock().unwrap().remove(code);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match self.coupons.get(code) {
            Some(CouponReply::Valid(coupon)) => Ok(CouponValidation {
                valid: true,
                coupon: Some(coupon.clone()),
            }),
            Some(CouponReply::Status(status)) => Err(rejected(*status)),
            Some(CouponReply::Invalid) | None => Ok(CouponValidation {
                valid: false,
                coupon: None,
            }),
        }
    }
}

#[async_trait]
impl AddressStore for FakeBackend {
    async fn list_addresses(&self, _user: &UserId) -> Result<Vec<Address>, BackendError> {
        self.record_call();
        Ok(self.addresses.clone())
    }

    async fn add_address(&self, address: &NewAddress) -> Result<Address, BackendError> {
        self.record_call();
        self.log("address:add");
        if self.reject_addresses {
            return Err(rejected(400));
        }

        let mut added = self.added.lock().unwrap();
        added.push(address.clone());
        Ok(Address {
            id: AddressId::new(format!("new{}", added.len())),
            kind: address.kind.clone(),
            street: address.street.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            country: address.country.clone(),
            postal_code: address.postal_code.clone(),
            phone_number: address.phone_number.clone(),
            user: address.user.clone(),
        })
    }
}

#[async_trait]
impl CartStore for FakeBackend {
    async fn cart_items(&self, _user: &UserId) -> Result<Vec<CartItem>, BackendError> {
        self.record_call();
        Ok(self.items.clone())
    }

    async fn reset_cart(&self, _user: &UserId) -> Result<(), BackendError> {
        self.record_call();
        self.log("cart:reset");
        *self.cart_resets.lock().unwrap() += 1;
        Ok(())
    }
}

#[async_trait]
impl OrderService for FakeBackend {
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        self.record_call();
        self.log("order:create");

        let mut orders = self.orders.lock().unwrap();
        orders.push(order.clone());
        let id = match &self.order_reply {
            OrderReply::Rejected => return Err(rejected(500)),
            OrderReply::Created(id) => id.clone(),
            OrderReply::Numbered => format!("o{}", orders.len()),
        };

        Ok(Order {
            id: OrderId::new(id),
            payment_mode: Some(order.payment_mode),
            total: Some(order.total),
            payment_id: order.payment_id.clone(),
            status: Some("pending".to_string()),
            created_at: None,
        })
    }
}

/// Payment gateway with a scripted outcome.
pub struct FakePayments {
    outcome: Result<PaymentReceipt, PaymentError>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    requests: Mutex<Vec<PaymentRequest>>,
    seen: watch::Sender<usize>,
    journal: Journal,
}

impl FakePayments {
    fn with_outcome(outcome: Result<PaymentReceipt, PaymentError>) -> Self {
        Self {
            outcome,
            gate: Mutex::new(None),
            requests: Mutex::new(vec![]),
            seen: watch::channel(0).0,
            journal: Arc::default(),
        }
    }

    pub fn approving(payment_id: &str) -> Self {
        Self::with_outcome(Ok(PaymentReceipt {
            payment_id: payment_id.to_string(),
        }))
    }

    pub fn declining() -> Self {
        Self::with_outcome(Err(PaymentError::Dismissed))
    }

    /// Approves once the returned sender fires.
    pub fn gated(payment_id: &str) -> (Self, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        let payments = Self::approving(payment_id);
        *payments.gate.lock().unwrap() = Some(rx);
        (payments, tx)
    }

    /// Write into the backend's journal so call order can be asserted.
    pub fn sharing_journal(mut self, backend: &FakeBackend) -> Self {
        self.journal = Arc::clone(&backend.journal);
        self
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub async fn wait_for_requests(&self, count: usize) {
        let mut rx = self.seen.subscribe();
        rx.wait_for(|seen| *seen >= count).await.unwrap();
    }
}

#[async_trait]
impl PaymentGateway for FakePayments {
    async fn collect(&self, request: PaymentRequest) -> Result<PaymentReceipt, PaymentError> {
        self.journal
            .lock()
            .unwrap()
            .push("payment:collect".to_string());
        self.requests.lock().unwrap().push(request);
        self.seen.send_modify(|seen| *seen += 1);

        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if self.outcome.is_ok() {
            self.journal
                .lock()
                .unwrap()
                .push("payment:success".to_string());
        }
        self.outcome.clone()
    }
}
