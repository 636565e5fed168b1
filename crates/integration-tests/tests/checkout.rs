//! Checkout: stock locks, payment confirmation and lock release.

use std::time::Duration;

use ironhouse_integration_tests::stub_backend::{MEMBER_EMAIL, MEMBER_ID, VALID_SIGNATURE};
use ironhouse_integration_tests::{LockEvent, TestContext};
use reqwest::{Response, StatusCode};
use serde_json::{Value, json};

fn locked(product_id: &str, quantity: u32) -> LockEvent {
    LockEvent::Locked {
        product_id: product_id.to_string(),
        quantity,
    }
}

fn released(product_id: &str, quantity: u32) -> LockEvent {
    LockEvent::Released {
        product_id: product_id.to_string(),
        quantity,
    }
}

/// A logged-in member with `items` already in their backend cart.
async fn member_with_cart(items: &[(&str, u32)]) -> TestContext {
    login_with_cart(TestContext::new().await, items).await
}

async fn login_with_cart(ctx: TestContext, items: &[(&str, u32)]) -> TestContext {
    ctx.backend.seed_cart(MEMBER_ID, items);
    assert_eq!(ctx.login(MEMBER_EMAIL).await.status(), StatusCode::OK);
    ctx
}

async fn start_checkout(ctx: &TestContext, body: Value) -> Response {
    ctx.client
        .post(ctx.url("/api/checkout"))
        .json(&body)
        .send()
        .await
        .expect("checkout request")
}

async fn confirm(ctx: &TestContext, order_id: &str, signature: &str) -> Response {
    ctx.client
        .post(ctx.url("/api/checkout/confirm"))
        .json(&json!({
            "order_id": order_id,
            "payment_id": "pay_29QQoUBi66xm2f",
            "signature": signature,
        }))
        .send()
        .await
        .expect("confirm request")
}

#[tokio::test]
async fn test_guest_cannot_checkout() {
    let ctx = TestContext::new().await;
    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_cart_is_rejected() {
    let ctx = member_with_cart(&[]).await;
    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(ctx.backend.lock_events().is_empty());
}

#[tokio::test]
async fn test_failed_lock_releases_earlier_locks() {
    let ctx = member_with_cart(&[("p-whey", 1), ("p-belt", 1)]).await;
    ctx.backend.data().refuse_locks.insert("p-belt".to_string());

    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.expect("error body");
    assert!(body["error"].as_str().expect("message").contains("Lifting Belt"));

    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 1), released("p-whey", 1)]
    );
    assert!(ctx.backend.data().payment_orders.is_empty());
}

#[tokio::test]
async fn test_lock_rollback_releases_newest_first() {
    let ctx = TestContext::new().await;
    ctx.backend.add_product("p-bands", "Resistance Bands", 599, 20);
    let ctx = login_with_cart(ctx, &[("p-whey", 1), ("p-belt", 2), ("p-bands", 1)]).await;
    ctx.backend.data().refuse_locks.insert("p-bands".to_string());

    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(
        ctx.backend.lock_events(),
        [
            locked("p-whey", 1),
            locked("p-belt", 2),
            released("p-belt", 2),
            released("p-whey", 1),
        ]
    );
}

#[tokio::test]
async fn test_failed_payment_order_releases_every_lock() {
    let ctx = member_with_cart(&[("p-whey", 1), ("p-belt", 1)]).await;
    ctx.backend.data().fail_payment_orders = true;

    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        ctx.backend.lock_events(),
        [
            locked("p-whey", 1),
            locked("p-belt", 1),
            released("p-belt", 1),
            released("p-whey", 1),
        ]
    );

    // Nothing pending, so there is nothing to confirm.
    let resp = confirm(&ctx, "order_1", VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_payment_order_for_wrong_amount_is_refused() {
    let ctx = member_with_cart(&[("p-whey", 1)]).await;
    ctx.backend.data().payment_order_amount = Some(100);

    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.expect("error body");
    assert!(body.get("order_id").is_none());
    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 1), released("p-whey", 1)]
    );
}

#[tokio::test]
async fn test_expired_checkout_is_gone_and_releases_locks() {
    let ctx = login_with_cart(
        TestContext::with_lock_ttl(Duration::ZERO).await,
        &[("p-whey", 2)],
    )
    .await;

    let intent: Value = start_checkout(&ctx, json!({}))
        .await
        .json()
        .await
        .expect("intent body");
    let order_id = intent["order_id"].as_str().expect("order id");

    let resp = confirm(&ctx, order_id, VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 2), released("p-whey", 2)]
    );
    assert_eq!(ctx.backend.data().verify_calls, 0);

    let resp = confirm(&ctx, order_id, VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 2);
}

#[tokio::test]
async fn test_stock_shortfall_is_caught_before_locking() {
    let ctx = member_with_cart(&[("p-belt", 5)]).await;

    let resp = start_checkout(&ctx, json!({})).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(ctx.backend.lock_events().is_empty());
}

#[tokio::test]
async fn test_paid_checkout_keeps_locks_and_clears_cart() {
    let ctx = member_with_cart(&[("p-whey", 2)]).await;

    let resp = start_checkout(&ctx, json!({ "discount_code": "fit10" })).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let intent: Value = resp.json().await.expect("intent body");
    assert_eq!(intent["key_id"], "rzp_test_ironhouse");
    assert_eq!(intent["currency"], "INR");
    assert_eq!(intent["amount"], 449_820);
    assert_eq!(intent["totals"]["discount_code"], "FIT10");
    let order_id = intent["order_id"].as_str().expect("order id").to_string();

    let resp = confirm(&ctx, &order_id, VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order: Value = resp.json().await.expect("order body");
    assert_eq!(order["order_id"], "ord-1");

    assert_eq!(ctx.backend.lock_events(), [locked("p-whey", 2)]);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 0);

    // The pending checkout is gone once paid.
    let resp = confirm(&ctx, &order_id, VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rejected_payment_releases_locks() {
    let ctx = member_with_cart(&[("p-whey", 1)]).await;

    let intent: Value = start_checkout(&ctx, json!({}))
        .await
        .json()
        .await
        .expect("intent body");
    let order_id = intent["order_id"].as_str().expect("order id");

    let resp = confirm(&ctx, order_id, "sig_forged").await;
    assert_eq!(resp.status(), StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 1), released("p-whey", 1)]
    );

    // Nothing left to cancel, and cancelling twice is fine.
    for _ in 0..2 {
        let resp = ctx
            .client
            .post(ctx.url("/api/checkout/cancel"))
            .send()
            .await
            .expect("cancel request");
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
    assert_eq!(ctx.backend.lock_events().len(), 2);
}

#[tokio::test]
async fn test_mismatched_order_keeps_checkout_open() {
    let ctx = member_with_cart(&[("p-whey", 1)]).await;
    assert_eq!(start_checkout(&ctx, json!({})).await.status(), StatusCode::OK);

    let resp = confirm(&ctx, "order_someone_else", VALID_SIGNATURE).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(ctx.backend.lock_events(), [locked("p-whey", 1)]);

    let resp = ctx
        .client
        .post(ctx.url("/api/checkout/cancel"))
        .send()
        .await
        .expect("cancel request");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 1), released("p-whey", 1)]
    );
}

#[tokio::test]
async fn test_restarting_checkout_releases_previous_locks() {
    let ctx = member_with_cart(&[("p-belt", 2)]).await;

    assert_eq!(start_checkout(&ctx, json!({})).await.status(), StatusCode::OK);
    assert_eq!(start_checkout(&ctx, json!({})).await.status(), StatusCode::OK);

    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-belt", 2), released("p-belt", 2), locked("p-belt", 2)]
    );
}

#[tokio::test]
async fn test_logout_releases_unpaid_checkout() {
    let ctx = member_with_cart(&[("p-whey", 3)]).await;
    assert_eq!(start_checkout(&ctx, json!({})).await.status(), StatusCode::OK);

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/logout"))
        .send()
        .await
        .expect("logout request");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        ctx.backend.lock_events(),
        [locked("p-whey", 3), released("p-whey", 3)]
    );
}
