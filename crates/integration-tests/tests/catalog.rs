//! Public catalog, health probes and guest cart pricing.

use ironhouse_integration_tests::TestContext;
use reqwest::StatusCode;
use serde_json::{Value, json};

fn names(products: &Value) -> Vec<String> {
    products
        .as_array()
        .expect("product list is an array")
        .iter()
        .map(|p| p["name"].as_str().expect("product has a name").to_string())
        .collect()
}

#[tokio::test]
async fn test_health_carries_request_id_and_security_headers() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "lb-7f3a9c")
        .send()
        .await
        .expect("health request");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-request-id"], "lb-7f3a9c");
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "DENY");
    assert_eq!(resp.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_bogus_request_id_is_replaced() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "<script>")
        .send()
        .await
        .expect("health request");

    let id = resp.headers()["x-request-id"].to_str().expect("ascii id");
    assert_ne!(id, "<script>");
    assert!(!id.is_empty());
}

#[tokio::test]
async fn test_product_listing_hides_inactive_and_sorts() {
    let ctx = TestContext::new().await;

    let all: Value = ctx
        .client
        .get(ctx.url("/api/products?sort=price_asc"))
        .send()
        .await
        .expect("list request")
        .json()
        .await
        .expect("list body");

    assert_eq!(
        names(&all),
        ["Liquid Chalk", "Lifting Belt", "Whey Protein 1kg"]
    );

    let gear: Value = ctx
        .client
        .get(ctx.url("/api/products?category=GEAR&sort=name"))
        .send()
        .await
        .expect("filtered request")
        .json()
        .await
        .expect("filtered body");
    assert_eq!(names(&gear), ["Lifting Belt", "Liquid Chalk"]);
}

#[tokio::test]
async fn test_unknown_product_is_json_404() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/api/products/p-missing"))
        .send()
        .await
        .expect("show request");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("error body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_guest_cart_and_discount_preview() {
    let ctx = TestContext::new().await;

    let resp = ctx.add_to_cart("p-whey", 2).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let cart: Value = resp.json().await.expect("cart body");
    assert_eq!(cart["item_count"], 2);

    let count: Value = ctx
        .client
        .get(ctx.url("/api/cart/count"))
        .send()
        .await
        .expect("count request")
        .json()
        .await
        .expect("count body");
    assert_eq!(count["count"], 2);

    let resp = ctx
        .client
        .post(ctx.url("/api/cart/discount"))
        .json(&json!({ "code": "fit10" }))
        .send()
        .await
        .expect("discount request");
    assert_eq!(resp.status(), StatusCode::OK);
    let totals: Value = resp.json().await.expect("totals body");
    assert_eq!(totals["discount_code"], "FIT10");
    assert_ne!(totals["discount"], totals["subtotal"]);

    let resp = ctx
        .client
        .post(ctx.url("/api/cart/discount"))
        .json(&json!({ "code": "NOPE99" }))
        .send()
        .await
        .expect("discount request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_out_of_stock_and_inactive_products_cannot_be_added() {
    let ctx = TestContext::new().await;

    let resp = ctx.add_to_cart("p-chalk", 1).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx.add_to_cart("p-tee", 1).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = ctx.add_to_cart("p-belt", 4).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
