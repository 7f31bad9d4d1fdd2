//! Tests for the origin gatekeeper running in front of the routes

mod common;

use axum::http::header;
use axum::http::HeaderValue;
use common::{create_test_server, create_test_server_with, test_config};
use serde_json::Value;

fn origin(value: &'static str) -> HeaderValue {
    HeaderValue::from_static(value)
}

/// Test: an exactly-matching origin passes and gets CORS headers back
#[tokio::test]
async fn test_allowed_origin_passes() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .get("/api/auth/session")
        .add_header(header::ORIGIN, origin("https://app.example.com"))
        .await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("access-control-allow-origin"),
        "https://app.example.com"
    );
    assert_eq!(response.header("access-control-allow-credentials"), "true");
}

/// Test: near-miss origins are blocked with a structured 403
#[tokio::test]
async fn test_near_miss_origin_blocked() {
    let ctx = create_test_server();

    for near_miss in [
        "https://app.example.com/",
        "http://app.example.com",
        "https://evil.com",
    ] {
        let response = ctx
            .server
            .get("/api/auth/session")
            .add_header(header::ORIGIN, HeaderValue::from_static(near_miss))
            .await;

        assert_eq!(response.status_code(), 403, "{near_miss}");
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "CORS policy: Origin not allowed");
    }
}

/// Test: a blocked origin never reaches the handler
#[tokio::test]
async fn test_blocked_origin_never_reaches_handler() {
    let ctx = create_test_server();
    common::register_user(&ctx.server, "a@x.com", "Passw0rd").await;

    let response = ctx
        .server
        .post("/api/login")
        .add_header(header::ORIGIN, origin("https://evil.com"))
        .json(&serde_json::json!({ "email": "a@x.com", "password": "Passw0rd" }))
        .await;

    assert_eq!(response.status_code(), 403);
}

/// Test: requests without an Origin header are presumed non-browser
#[tokio::test]
async fn test_missing_origin_allowed() {
    let ctx = create_test_server();

    let response = ctx.server.get("/api/auth/session").await;
    assert_eq!(response.status_code(), 200);
}

/// Test: mobile scheme prefixes pass in strict mode
#[tokio::test]
async fn test_mobile_scheme_allowed() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .get("/api/auth/session")
        .add_header(header::ORIGIN, origin("nopassmobile://redirect"))
        .await;

    assert_eq!(response.status_code(), 200);
}

/// Test: preflights are always answered, never blocked
#[tokio::test]
async fn test_preflight_always_answered() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .method(axum::http::Method::OPTIONS, "/api/password")
        .add_header(header::ORIGIN, origin("https://evil.com"))
        .await;

    assert_eq!(response.status_code(), 204);
    assert_eq!(response.header("access-control-allow-origin"), "null");
    assert!(response
        .header("access-control-allow-methods")
        .to_str()
        .unwrap()
        .contains("DELETE"));

    let response = ctx
        .server
        .method(axum::http::Method::OPTIONS, "/api/password")
        .add_header(header::ORIGIN, origin("https://app.example.com"))
        .await;
    assert_eq!(response.status_code(), 204);
    assert_eq!(
        response.header("access-control-allow-origin"),
        "https://app.example.com"
    );
    assert_eq!(response.header("access-control-max-age"), "86400");
}

/// Test: with strict checking off the gate fails open
#[tokio::test]
async fn test_fail_open_when_not_strict() {
    let mut config = test_config();
    config.strict_origin_check = false;
    let ctx = create_test_server_with(config);

    // Loopback markers classify as allowed
    let response = ctx
        .server
        .get("/api/auth/session")
        .add_header(header::ORIGIN, origin("http://localhost:3000"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(
        response.header("access-control-allow-origin"),
        "http://localhost:3000"
    );

    // Even a foreign origin passes through; it only loses the CORS echo
    let response = ctx
        .server
        .get("/api/auth/session")
        .add_header(header::ORIGIN, origin("https://evil.com"))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("access-control-allow-origin"), "null");
}

/// Test: defensive headers ride on every allowed response
#[tokio::test]
async fn test_defensive_headers() {
    let ctx = create_test_server();

    let response = ctx.server.get("/api/auth/session").await;

    assert_eq!(response.header("x-content-type-options"), "nosniff");
    assert_eq!(response.header("x-frame-options"), "DENY");
    assert_eq!(response.header("x-xss-protection"), "1; mode=block");
    assert!(response.maybe_header("strict-transport-security").is_none());
}

/// Test: HSTS appears only when configured on
#[tokio::test]
async fn test_hsts_when_configured() {
    let mut config = test_config();
    config.hsts = true;
    let ctx = create_test_server_with(config);

    let response = ctx.server.get("/api/auth/session").await;

    assert_eq!(
        response.header("strict-transport-security"),
        "max-age=31536000; includeSubDomains; preload"
    );
}
