//! End-to-end checkout flows over HTTP against a mock backend.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use apex_integration_tests::{TestContext, address_json, cart_json};
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, ResponseTemplate};

// =============================================================================
// Backend Fixtures
// =============================================================================

async fn stock_backend(ctx: &TestContext, addresses: Value, cart: Value) {
    Mock::given(method("GET"))
        .and(path("/api/address/user/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(addresses))
        .mount(&ctx.backend)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/cart/user/u1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(cart))
        .mount(&ctx.backend)
        .await;
}

async fn accept_cart_reset(ctx: &TestContext, times: u64) {
    Mock::given(method("DELETE"))
        .and(path("/api/cart/user/u1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(times)
        .mount(&ctx.backend)
        .await;
}

fn created_order(id: &str, mode: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(json!({
        "_id": id,
        "paymentMode": mode,
        "status": "Pending"
    }))
}

/// Bodies of the orders the backend received.
async fn received_orders(ctx: &TestContext) -> Vec<Value> {
    ctx.backend
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/api/orders")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

fn amount(value: &Value) -> f64 {
    value.as_f64().unwrap()
}

// =============================================================================
// Basics
// =============================================================================

#[tokio::test]
async fn test_health() {
    let ctx = TestContext::new().await;
    let (status, body) = ctx.send_anonymous(Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_checkout_requires_customer() {
    let ctx = TestContext::new().await;
    let (status, _) = ctx.send_anonymous(Method::GET, "/checkout").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_show_checkout() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1"), address_json("a2")]), cart_json(500.0, 2)).await;

    let (status, body) = ctx.send(Method::GET, "/checkout", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selected_address"], "a1");
    assert_eq!(body["payment_mode"], "COD");
    assert_eq!(amount(&body["totals"]["subtotal"]), 1000.0);
    assert_eq!(amount(&body["totals"]["final_amount"]), 1060.0);
    assert_eq!(body["pending_payment"], Value::Null);
    assert_eq!(body["redirect"], Value::Null);
}

#[tokio::test]
async fn test_backend_down_is_bad_gateway() {
    let ctx = TestContext::new().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.backend)
        .await;

    let (status, body) = ctx.send(Method::GET, "/checkout", None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Backend service error");
}

// =============================================================================
// Addresses
// =============================================================================

#[tokio::test]
async fn test_select_unknown_address() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(100.0, 1)).await;

    let (status, _) = ctx
        .send(Method::PUT, "/checkout/address", Some(json!({ "address_id": "zz" })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_add_address_rejected_raises_alert() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([]), cart_json(100.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/address"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad phone"))
        .mount(&ctx.backend)
        .await;

    let form = json!({
        "type": "Home",
        "street": "12 MG Road",
        "city": "Pune",
        "state": "MH",
        "country": "India",
        "postalCode": "411001",
        "phoneNumber": "98"
    });
    let (status, body) = ctx
        .send(Method::POST, "/checkout/addresses", Some(form))
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["notices"][0]["level"], "alert");
    assert_eq!(body["notices"][0]["message"], "Error adding your address");
    assert_eq!(body["address_draft"]["phoneNumber"], "98");
}

#[tokio::test]
async fn test_add_incomplete_address_is_unprocessable() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([]), cart_json(100.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/address"))
        .respond_with(ResponseTemplate::new(201).set_body_json(address_json("a1")))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    let (status, body) = ctx
        .send(Method::POST, "/checkout/addresses", Some(json!({ "street": "12 MG Road" })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("city"));
}

// =============================================================================
// Coupons
// =============================================================================

#[tokio::test]
async fn test_apply_coupon() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(1000.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .and(body_partial_json(json!({ "code": "SAVE10" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "coupon": { "code": "SAVE10", "discountType": "percentage", "discountValue": 10 }
        })))
        .expect(1)
        .mount(&ctx.backend)
        .await;

    let (status, body) = ctx
        .send(Method::POST, "/checkout/coupon", Some(json!({ "code": " save10 " })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied_coupon"]["code"], "SAVE10");
    assert_eq!(amount(&body["totals"]["discount"]), 100.0);
    assert_eq!(amount(&body["totals"]["final_amount"]), 960.0);
    assert_eq!(body["notices"][0]["message"], "Coupon applied! You saved ₹100");

    let (status, body) = ctx.send(Method::DELETE, "/checkout/coupon", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["applied_coupon"], Value::Null);
    assert_eq!(amount(&body["totals"]["discount"]), 0.0);
}

#[tokio::test]
async fn test_coupon_service_failure() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(1000.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/coupons/validate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&ctx.backend)
        .await;

    let (status, body) = ctx
        .send(Method::POST, "/checkout/coupon", Some(json!({ "code": "SAVE10" })))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["applied_coupon"], Value::Null);
    assert!(!body["coupon_error"].as_str().unwrap().is_empty());
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_submit_without_address() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([]), cart_json(100.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(created_order("o1", "COD"))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    let (status, body) = ctx.send(Method::POST, "/checkout/order", None).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["outcome"], "missing_address");
    assert_eq!(body["notices"].as_array().unwrap().len(), 1);
    assert_eq!(body["notices"][0]["message"], "Please select a delivery address");
}

#[tokio::test]
async fn test_cash_on_delivery_order() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(1000.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(body_partial_json(json!({ "user": "u1", "paymentMode": "COD" })))
        .respond_with(created_order("o1", "COD"))
        .expect(1)
        .mount(&ctx.backend)
        .await;
    accept_cart_reset(&ctx, 1).await;

    let (status, body) = ctx.send(Method::POST, "/checkout/order", None).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["outcome"], "placed");
    assert_eq!(body["redirect"], "/order-success/o1");

    let orders = received_orders(&ctx).await;
    assert_eq!(orders.len(), 1);
    assert!(orders[0].get("paymentId").is_none());
    assert_eq!(amount(&orders[0]["total"]), 1060.0);
    assert_eq!(orders[0]["item"][0]["product"]["_id"], "p1");
    assert_eq!(orders[0]["address"]["_id"], "a1");
}

#[tokio::test]
async fn test_card_order_after_widget_callback() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(1000.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .and(body_partial_json(json!({ "paymentMode": "CARD", "paymentId": "pay_N1x" })))
        .respond_with(created_order("o7", "CARD"))
        .expect(1)
        .mount(&ctx.backend)
        .await;
    accept_cart_reset(&ctx, 1).await;

    let (status, _) = ctx
        .send(Method::PUT, "/checkout/payment-mode", Some(json!({ "payment_mode": "CARD" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send(Method::POST, "/checkout/order", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["outcome"], "awaiting_payment");
    let pending = &body["pending_payment"];
    assert_eq!(pending["amount"], 106_000);
    assert_eq!(pending["currency"], "INR");
    assert_eq!(pending["key"], "rzp_test_K9xQ2mVb7LpT");
    assert_eq!(pending["description"], "Order Payment");
    assert_eq!(pending["prefill"]["contact"], "9876543210");
    assert!(received_orders(&ctx).await.is_empty());

    let reference = pending["reference"].as_str().unwrap().to_string();
    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/checkout/payment/{reference}"),
            Some(json!({ "razorpay_payment_id": "pay_N1x" })),
        )
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let mut redirect = Value::Null;
    for _ in 0..50 {
        let (_, body) = ctx.send(Method::GET, "/checkout", None).await;
        if !body["redirect"].is_null() {
            redirect = body["redirect"].clone();
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(redirect, "/order-success/o7");
    assert_eq!(received_orders(&ctx).await.len(), 1);
}

#[tokio::test]
async fn test_dismissed_card_payment_creates_no_order() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(250.0, 1)).await;
    Mock::given(method("POST"))
        .and(path("/api/orders"))
        .respond_with(created_order("o1", "CARD"))
        .expect(0)
        .mount(&ctx.backend)
        .await;

    ctx.send(Method::PUT, "/checkout/payment-mode", Some(json!({ "payment_mode": "CARD" })))
        .await;
    let (_, body) = ctx.send(Method::POST, "/checkout/order", None).await;
    let reference = body["pending_payment"]["reference"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/checkout/payment/{reference}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let mut submitting = true;
    for _ in 0..50 {
        let (_, body) = ctx.send(Method::GET, "/checkout", None).await;
        if body["submitting"] == false {
            submitting = false;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(!submitting);
}

#[tokio::test]
async fn test_unknown_payment_reference() {
    let ctx = TestContext::new().await;
    stock_backend(&ctx, json!([address_json("a1")]), cart_json(100.0, 1)).await;

    let (status, _) = ctx
        .send(
            Method::POST,
            "/checkout/payment/00000000-0000-0000-0000-000000000000",
            Some(json!({ "payment_id": "pay_1" })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
