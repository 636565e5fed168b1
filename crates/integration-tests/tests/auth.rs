//! Signup, login, logout and password reset through the storefront.

use ironhouse_integration_tests::TestContext;
use ironhouse_integration_tests::stub_backend::{MEMBER_EMAIL, PASSWORD, VALID_OTP};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
async fn test_me_requires_login() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .get(ctx.url("/api/auth/me"))
        .send()
        .await
        .expect("me request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("error body");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_login_me_logout() {
    let ctx = TestContext::new().await;

    let resp = ctx.login(MEMBER_EMAIL).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let login: Value = resp.json().await.expect("login body");
    assert_eq!(login["user"]["email"], MEMBER_EMAIL);
    assert_eq!(login["user"]["role"], "member");
    assert!(login["user"].get("token").is_none());

    let me: Value = ctx
        .client
        .get(ctx.url("/api/auth/me"))
        .send()
        .await
        .expect("me request")
        .json()
        .await
        .expect("me body");
    assert_eq!(me["name"], "Asha Rao");

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/logout"))
        .send()
        .await
        .expect("logout request");
    assert!(resp.status().is_success());

    let resp = ctx
        .client
        .get(ctx.url("/api/auth/me"))
        .send()
        .await
        .expect("me request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/login"))
        .json(&json!({ "email": MEMBER_EMAIL, "password": "Not-the-password1" }))
        .send()
        .await
        .expect("login request");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_signup_then_verify_logs_in() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/signup"))
        .json(&json!({
            "name": "Vikram Shah",
            "email": "Vikram@Ironhouse.test",
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("signup request");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let signup: Value = resp.json().await.expect("signup body");
    assert_eq!(signup["email"], "vikram@ironhouse.test");

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/verify-otp"))
        .json(&json!({ "email": "vikram@ironhouse.test", "otp": "000000" }))
        .send()
        .await
        .expect("verify request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/verify-otp"))
        .json(&json!({ "email": "vikram@ironhouse.test", "otp": VALID_OTP }))
        .send()
        .await
        .expect("verify request");
    assert_eq!(resp.status(), StatusCode::OK);

    let me: Value = ctx
        .client
        .get(ctx.url("/api/auth/me"))
        .send()
        .await
        .expect("me request")
        .json()
        .await
        .expect("me body");
    assert_eq!(me["email"], "vikram@ironhouse.test");
}

#[tokio::test]
async fn test_malformed_otp_never_reaches_backend() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/verify-otp"))
        .json(&json!({ "email": MEMBER_EMAIL, "otp": "12ab" }))
        .send()
        .await
        .expect("verify request");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_forgot_password_does_not_reveal_accounts() {
    let ctx = TestContext::new().await;

    for email in [MEMBER_EMAIL, "nobody@ironhouse.test"] {
        let resp = ctx
            .client
            .post(ctx.url("/api/auth/forgot-password"))
            .json(&json!({ "email": email }))
            .send()
            .await
            .expect("forgot request");
        assert_eq!(resp.status(), StatusCode::ACCEPTED, "{email}");
    }
}

#[tokio::test]
async fn test_reset_password_checks_code() {
    let ctx = TestContext::new().await;

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/reset-password"))
        .json(&json!({
            "email": MEMBER_EMAIL,
            "otp": "999999",
            "new_password": PASSWORD,
        }))
        .send()
        .await
        .expect("reset request");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ctx
        .client
        .post(ctx.url("/api/auth/reset-password"))
        .json(&json!({
            "email": MEMBER_EMAIL,
            "otp": VALID_OTP,
            "new_password": PASSWORD,
        }))
        .send()
        .await
        .expect("reset request");
    assert_eq!(resp.status(), StatusCode::OK);
}
