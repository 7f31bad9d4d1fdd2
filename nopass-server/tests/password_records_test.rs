//! Tests for password-record CRUD over the session surface

mod common;

use common::{create_session, create_test_server, session_cookie};
use serde_json::{json, Value};

/// Test: creating a record unauthenticated is rejected
#[tokio::test]
async fn test_create_unauthenticated() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/password")
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "hunter2",
        }))
        .await;

    assert_eq!(response.status_code(), 401);
}

/// Test: create + list round-trip decrypts the stored value
#[tokio::test]
async fn test_create_and_list() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "hunter2",
            "notes": "personal",
        }))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["password"], "hunter2");

    let response = ctx
        .server
        .get("/api/password")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["website"], "example.com");
    assert_eq!(data[0]["password"], "hunter2");
    assert_eq!(data[0]["notes"], "personal");
}

/// Test: the persisted value is an envelope, never the plaintext
#[tokio::test]
async fn test_stored_value_is_encrypted() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    ctx.server
        .post("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "hunter2",
        }))
        .await;

    use nopass_server::VaultStore;
    let records = ctx.state.store.list_password_records("a@x.com").unwrap();
    let stored = &records[0].password_encrypted;

    assert_ne!(stored, "hunter2");
    assert!(!stored.contains("hunter2"));
    // Three hex segments: nonce, ciphertext, tag
    assert_eq!(stored.split(':').count(), 3);
}

/// Test: countOnly returns a bare count without decrypting anything
#[tokio::test]
async fn test_count_only() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    for i in 0..3 {
        ctx.server
            .post("/api/password")
            .add_cookie(session_cookie(&cookie))
            .json(&json!({
                "website": format!("site-{i}.com"),
                "username": "alice",
                "password": "hunter2",
            }))
            .await;
    }

    let response = ctx
        .server
        .get("/api/password")
        .add_query_param("countOnly", "true")
        .add_cookie(session_cookie(&cookie))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["count"], 3);
    assert!(body.get("data").is_none());
}

/// Test: update re-encrypts and bumps updated_at
#[tokio::test]
async fn test_update() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "hunter2",
        }))
        .await;
    let body: Value = response.json();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = ctx
        .server
        .put("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "id": id,
            "website": "example.com",
            "username": "alice",
            "password": "new-secret",
        }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["data"]["password"], "new-secret");

    // Missing id is a 400
    let response = ctx
        .server
        .put("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "x-secret",
        }))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: delete removes permanently; unknown id is a 404
#[tokio::test]
async fn test_delete() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "example.com",
            "username": "alice",
            "password": "hunter2",
        }))
        .await;
    let body: Value = response.json();
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let response = ctx
        .server
        .delete("/api/password")
        .add_query_param("id", &id)
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 200);

    // Second delete: the record is gone
    let response = ctx
        .server
        .delete("/api/password")
        .add_query_param("id", &id)
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 404);

    // Missing id
    let response = ctx
        .server
        .delete("/api/password")
        .add_cookie(session_cookie(&cookie))
        .await;
    assert_eq!(response.status_code(), 400);
}

/// Test: field-level validation detail on bad input
#[tokio::test]
async fn test_validation_issues() {
    let ctx = create_test_server();
    let cookie = create_session(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/password")
        .add_cookie(session_cookie(&cookie))
        .json(&json!({
            "website": "",
            "username": "alice",
        }))
        .await;

    assert_eq!(response.status_code(), 422);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    let issues = body["issues"].as_array().unwrap();
    let fields: Vec<&str> = issues.iter().map(|i| i["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"website"));
    assert!(fields.contains(&"password"));
    assert!(!fields.contains(&"username"));
}
