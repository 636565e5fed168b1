//! Guest carts survive login and are folded into the member's backend cart.

use ironhouse_integration_tests::TestContext;
use ironhouse_integration_tests::stub_backend::{MEMBER_EMAIL, MEMBER_ID};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_guest_cart_merges_on_login() {
    let ctx = TestContext::new().await;
    ctx.backend.seed_cart(MEMBER_ID, &[("p-whey", 1)]);

    assert_eq!(ctx.add_to_cart("p-whey", 2).await.status(), StatusCode::CREATED);
    assert_eq!(ctx.add_to_cart("p-belt", 1).await.status(), StatusCode::CREATED);

    let resp = ctx.login(MEMBER_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: Value = resp.json().await.expect("login body");
    assert_eq!(login["merged_items"], 2);
    assert_eq!(login["skipped_items"], 0);

    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 3);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-belt"), 1);

    let count: Value = ctx
        .client
        .get(ctx.url("/api/cart/count"))
        .send()
        .await
        .expect("count request")
        .json()
        .await
        .expect("count body");
    assert_eq!(count["count"], 4);
}

#[tokio::test]
async fn test_merge_clamps_to_stock_and_skips_retired_products() {
    let ctx = TestContext::new().await;

    assert_eq!(ctx.add_to_cart("p-belt", 3).await.status(), StatusCode::CREATED);
    assert_eq!(ctx.add_to_cart("p-whey", 1).await.status(), StatusCode::CREATED);

    // Stock drops and a product is retired while the guest is browsing.
    {
        let mut data = ctx.backend.data();
        for product in &mut data.products {
            match product.id.as_str() {
                "p-belt" => product.stock = 2,
                "p-whey" => product.is_active = false,
                _ => {}
            }
        }
    }

    let login: Value = ctx
        .login(MEMBER_EMAIL)
        .await
        .json()
        .await
        .expect("login body");
    assert_eq!(login["merged_items"], 1);
    assert_eq!(login["skipped_items"], 1);

    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-belt"), 2);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 0);
}

#[tokio::test]
async fn test_member_cart_edits_go_to_backend() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.login(MEMBER_EMAIL).await.status(), StatusCode::OK);

    assert_eq!(ctx.add_to_cart("p-whey", 1).await.status(), StatusCode::CREATED);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 1);

    let resp = ctx
        .client
        .patch(ctx.url("/api/cart/items/p-whey"))
        .json(&json!({ "quantity": 4 }))
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 4);

    let resp = ctx
        .client
        .patch(ctx.url("/api/cart/items/p-belt"))
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("update request");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = ctx
        .client
        .delete(ctx.url("/api/cart/items/p-whey"))
        .send()
        .await
        .expect("remove request");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(ctx.backend.cart_quantity(MEMBER_ID, "p-whey"), 0);
}
