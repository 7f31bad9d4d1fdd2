//! Tests for the password-reset flow

mod common;

use common::{create_test_server, register_user};
use serde_json::{json, Value};

/// Test: unknown email gets a 404 and no mail is sent
#[tokio::test]
async fn test_forgot_password_unknown_email() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "nobody@x.com" }))
        .await;

    assert_eq!(response.status_code(), 404);
    let body: Value = response.json();
    assert_eq!(body["message"], "No account found with this email");
    assert_eq!(ctx.mail.sent_count(), 0);
}

/// Test: full reset flow, ending with a login using the new password
#[tokio::test]
async fn test_reset_flow() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "OldPassw0rd").await;

    let response = ctx
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let link = ctx.mail.get_link("a@x.com").expect("No reset mail sent");
    assert!(link.starts_with("https://vault.example.com/reset-password?token="));
    let token = ctx.mail.get_reset_token("a@x.com").unwrap();

    // The raw token never equals the stored digest
    use nopass_server::VaultStore;
    let identity = ctx.state.store.get_identity_by_email("a@x.com").unwrap().unwrap();
    assert_ne!(identity.reset_token_hash.as_deref(), Some(token.as_str()));

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Old password no longer works, new one does
    let response = ctx
        .server
        .post("/api/login")
        .json(&json!({ "email": "a@x.com", "password": "OldPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let response = ctx
        .server
        .post("/api/login")
        .json(&json!({ "email": "a@x.com", "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 200);
}

/// Test: a consumed token cannot be replayed
#[tokio::test]
async fn test_reset_token_single_use() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "OldPassw0rd").await;

    ctx.server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    let token = ctx.mail.get_reset_token("a@x.com").unwrap();

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 200);

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "AnotherPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["message"], "Invalid or expired token.");
}

/// Test: an expired token is rejected
#[tokio::test]
async fn test_reset_token_expiry() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "OldPassw0rd").await;

    ctx.server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    let token = ctx.mail.get_reset_token("a@x.com").unwrap();

    // Age the stored expiry past the deadline
    use nopass_server::VaultStore;
    let identity = ctx.state.store.get_identity_by_email("a@x.com").unwrap().unwrap();
    let digest = identity.reset_token_hash.clone().unwrap();
    ctx.state
        .store
        .set_reset_token(
            "a@x.com",
            &digest,
            chrono::Utc::now() - chrono::Duration::minutes(1),
        )
        .unwrap();

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: a bogus token and missing fields are rejected
#[tokio::test]
async fn test_reset_bad_requests() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "OldPassw0rd").await;

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": "bogus", "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "password": "NewPassw0rd" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let response = ctx
        .server
        .post("/api/auth/forgot-password")
        .json(&json!({}))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: the reset password must satisfy the length policy
#[tokio::test]
async fn test_reset_password_policy() {
    let ctx = create_test_server();
    register_user(&ctx.server, "a@x.com", "OldPassw0rd").await;

    ctx.server
        .post("/api/auth/forgot-password")
        .json(&json!({ "email": "a@x.com" }))
        .await;
    let token = ctx.mail.get_reset_token("a@x.com").unwrap();

    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "short" }))
        .await;
    assert_eq!(response.status_code(), 400);

    // The token survives a failed attempt
    let response = ctx
        .server
        .post("/api/auth/reset-password")
        .json(&json!({ "token": token, "password": "LongEnough1" }))
        .await;
    assert_eq!(response.status_code(), 200);
}
