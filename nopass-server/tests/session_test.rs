//! Tests for session sign-in/out and the session context

mod common;

use common::{create_session, create_test_server, register_user, session_cookie};
use serde_json::{json, Value};

/// Test: sign-in sets a session cookie and the context reflects it
#[tokio::test]
async fn test_sign_in_creates_session() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .get("/api/auth/session")
        .add_cookie(session_cookie(&cookie))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "a@x.com");
}

/// Test: no cookie means unauthenticated context, not an error
#[tokio::test]
async fn test_session_context_unauthenticated() {
    let ctx = create_test_server();

    let response = ctx.server.get("/api/auth/session").await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["authenticated"], false);
    assert!(body.get("user").is_none());
}

/// Test: a forged or garbage session cookie does not authenticate
#[tokio::test]
async fn test_forged_session_cookie_rejected() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    // Unsigned raw value and a tampered signed value both fail
    let tampered = format!("{}x", cookie);
    for forged in ["some-session-id", tampered.as_str()] {
        let response = ctx
            .server
            .get("/api/user")
            .add_cookie(session_cookie(forged))
            .await;
        assert_eq!(response.status_code(), 401);
    }
}

/// Test: sign-out destroys the session server-side
#[tokio::test]
async fn test_sign_out_destroys_session() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/auth/sign-out")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 200);

    // The old cookie no longer resolves to a session
    let response = ctx
        .server
        .get("/api/user")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 401);
}

/// Test: /api/user returns the profile without secret material
#[tokio::test]
async fn test_user_profile() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "profile@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .get("/api/user")
        .add_cookie(session_cookie(&cookie))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["email"], "profile@x.com");
    assert_eq!(body["provider"], "credentials");
    assert!(body["lastLogin"].is_string());
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

/// Test: sign-in validates the redirect target
#[tokio::test]
async fn test_sign_in_redirect_validation() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/auth/sign-in")
        .json(&json!({
            "email": "a@x.com",
            "password": "Passw0rd",
            "callbackUrl": "/dashboard",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["url"], "https://vault.example.com/dashboard");

    // A foreign origin falls back to the application root
    let response = ctx
        .server
        .post("/api/auth/sign-in")
        .json(&json!({
            "email": "a@x.com",
            "password": "Passw0rd",
            "callbackUrl": "https://evil.com/phish",
        }))
        .await;
    let body: Value = response.json();
    assert_eq!(body["url"], "https://vault.example.com");
}
