//! Membership purchases and the account membership view.

use chrono::{DateTime, Duration, Utc};
use ironhouse_integration_tests::TestContext;
use ironhouse_integration_tests::stub_backend::{
    MEMBER_EMAIL, MONTHLY_PLAN_ID, RETIRED_PLAN_ID, VALID_SIGNATURE,
};
use reqwest::{Response, StatusCode};
use serde_json::{Value, json};

const PAYMENT_ID: &str = "pay_3kV9mQ2wXr7Ln";

fn time(value: &Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).expect("timestamp")
}

async fn member() -> TestContext {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.login(MEMBER_EMAIL).await.status(), StatusCode::OK);
    ctx
}

/// Start a plan checkout and return the payment order ID.
async fn start_plan(ctx: &TestContext, plan_id: &str) -> String {
    let resp = ctx
        .post_json("/api/checkout/plan", &json!({ "plan_id": plan_id }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let intent: Value = resp.json().await.expect("intent body");
    intent["order_id"].as_str().expect("order id").to_string()
}

async fn confirm_plan(ctx: &TestContext, order_id: &str) -> Response {
    ctx.post_json(
        "/api/checkout/plan/confirm",
        &json!({
            "order_id": order_id,
            "payment_id": PAYMENT_ID,
            "signature": VALID_SIGNATURE,
        }),
    )
    .await
}

#[tokio::test]
async fn test_membership_view_requires_login() {
    let ctx = TestContext::new().await;
    let resp = ctx
        .client
        .get(ctx.url("/api/account/membership"))
        .send()
        .await
        .expect("membership request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_renewal_starts_when_current_membership_ends() {
    let ctx = member().await;
    let current_end = ctx.backend.data().memberships[0].ends_at;

    let resp = ctx
        .post_json("/api/checkout/plan", &json!({ "plan_id": MONTHLY_PLAN_ID }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let intent: Value = resp.json().await.expect("intent body");
    assert_eq!(intent["amount"], 149_900);
    assert_eq!(intent["currency"], "INR");
    let order_id = intent["order_id"].as_str().expect("order id");

    let resp = confirm_plan(&ctx, order_id).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let membership: Value = resp.json().await.expect("membership body");
    assert_eq!(time(&membership["startsAt"]), current_end);
    assert_eq!(time(&membership["endsAt"]), current_end + Duration::days(30));
    assert_eq!(membership["paymentId"], PAYMENT_ID);

    let summary = ctx.get_json("/api/account/membership").await;
    assert_eq!(time(&summary["active"]["ends_at"]), current_end);
    let history = summary["history"].as_array().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["status"], "upcoming");
    assert_eq!(history[1]["status"], "active");
}

#[tokio::test]
async fn test_paid_plan_survives_failed_subscription() {
    let ctx = member().await;
    ctx.backend.data().failing_subscriptions = 1;
    let order_id = start_plan(&ctx, MONTHLY_PLAN_ID).await;

    let resp = confirm_plan(&ctx, &order_id).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    {
        let data = ctx.backend.data();
        assert_eq!(data.verify_calls, 1);
        assert_eq!(data.subscribe_calls, 1);
        assert_eq!(data.memberships.len(), 1);
    }

    // The paid checkout is neither dropped by cancel nor replaced.
    let resp = ctx
        .client
        .post(ctx.url("/api/checkout/cancel"))
        .send()
        .await
        .expect("cancel request");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let resp = ctx
        .post_json("/api/checkout/plan", &json!({ "plan_id": MONTHLY_PLAN_ID }))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = confirm_plan(&ctx, &order_id).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let data = ctx.backend.data();
    assert_eq!(data.verify_calls, 1);
    assert_eq!(data.subscribe_calls, 2);
    assert_eq!(data.memberships.len(), 2);
    assert_eq!(data.memberships[1].payment_id.as_deref(), Some(PAYMENT_ID));
}

#[tokio::test]
async fn test_membership_outage_stops_confirm_before_payment_is_verified() {
    let ctx = member().await;
    let order_id = start_plan(&ctx, MONTHLY_PLAN_ID).await;
    ctx.backend.data().fail_membership_reads = true;

    let resp = confirm_plan(&ctx, &order_id).await;
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(ctx.backend.data().verify_calls, 0);
    assert_eq!(ctx.backend.data().subscribe_calls, 0);

    ctx.backend.data().fail_membership_reads = false;
    let resp = confirm_plan(&ctx, &order_id).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(ctx.backend.data().verify_calls, 1);
}

#[tokio::test]
async fn test_retired_plan_cannot_be_bought() {
    let ctx = member().await;
    let resp = ctx
        .post_json("/api/checkout/plan", &json!({ "plan_id": RETIRED_PLAN_ID }))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert!(ctx.backend.data().payment_orders.is_empty());
}
