//! Origin gatekeeper
//!
//! Request-level cross-origin policy applied before any handler runs.
//! Preflights are always answered with permission metadata; actual
//! blocking happens only when strict checking is enabled.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Methods advertised in CORS responses
const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
/// Headers advertised in CORS responses
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, Accept";
/// Preflight cache lifetime in seconds
const MAX_AGE: &str = "86400";

/// Origin policy, fixed at startup
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    /// Exact origins allowed for browser clients
    pub allowed_origins: Vec<String>,
    /// URI scheme prefixes identifying the mobile client
    pub allowed_mobile_schemes: Vec<String>,
    /// When false, blocking is disabled entirely (development fail-open)
    pub strict: bool,
    /// Add Strict-Transport-Security to allowed responses
    pub hsts: bool,
}

/// Outcome of classifying a request origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Blocked,
}

/// Classify a request origin against the policy
///
/// A request is allowed when the origin matches the allow-list exactly,
/// when there is no Origin header (presumed non-browser client), when the
/// origin starts with an allowed mobile scheme, or — outside strict mode —
/// when it carries a loopback/private-network marker.
pub fn classify(origin: Option<&str>, policy: &OriginPolicy) -> Decision {
    let Some(origin) = origin else {
        return Decision::Allowed;
    };

    if policy.allowed_origins.iter().any(|allowed| allowed == origin) {
        return Decision::Allowed;
    }

    if policy
        .allowed_mobile_schemes
        .iter()
        .any(|scheme| origin.starts_with(scheme.as_str()))
    {
        return Decision::Allowed;
    }

    if !policy.strict && (origin.contains("localhost") || origin.contains("192.168")) {
        return Decision::Allowed;
    }

    Decision::Blocked
}

fn allow_origin_value(origin: Option<&str>, decision: Decision) -> HeaderValue {
    let value = match (decision, origin) {
        (Decision::Allowed, Some(origin)) => origin,
        (Decision::Allowed, None) => "*",
        (Decision::Blocked, _) => "null",
    };
    HeaderValue::from_str(value).unwrap_or_else(|_| HeaderValue::from_static("null"))
}

/// Gatekeeper middleware, layered in front of every route
pub async fn gatekeeper(
    State(policy): State<Arc<OriginPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let decision = classify(origin.as_deref(), &policy);

    // Preflights are never blocked, only answered with the policy
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::NO_CONTENT.into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            allow_origin_value(origin.as_deref(), decision),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        return response;
    }

    if policy.strict && decision == Decision::Blocked {
        tracing::warn!(origin = ?origin, "Origin blocked");
        let body = json!({ "success": false, "message": "CORS policy: Origin not allowed" });
        return (StatusCode::FORBIDDEN, axum::Json(body)).into_response();
    }

    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        allow_origin_value(origin.as_deref(), decision),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );

    // Defensive headers on every pass-through response
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::X_XSS_PROTECTION,
        HeaderValue::from_static("1; mode=block"),
    );

    if policy.hsts {
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains; preload"),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict_policy() -> OriginPolicy {
        OriginPolicy {
            allowed_origins: vec!["https://app.example.com".to_string()],
            allowed_mobile_schemes: vec!["exp://".to_string(), "nopassmobile://".to_string()],
            strict: true,
            hsts: false,
        }
    }

    #[test]
    fn test_exact_origin_allowed() {
        let policy = strict_policy();
        assert_eq!(
            classify(Some("https://app.example.com"), &policy),
            Decision::Allowed
        );
    }

    #[test]
    fn test_near_miss_origins_blocked() {
        let policy = strict_policy();
        for near_miss in [
            "https://app.example.com/",
            "http://app.example.com",
            "https://app.example.com.evil.com",
            "https://evil.com",
        ] {
            assert_eq!(classify(Some(near_miss), &policy), Decision::Blocked, "{near_miss}");
        }
    }

    #[test]
    fn test_missing_origin_allowed() {
        assert_eq!(classify(None, &strict_policy()), Decision::Allowed);
    }

    #[test]
    fn test_mobile_scheme_prefix_allowed() {
        let policy = strict_policy();
        assert_eq!(
            classify(Some("nopassmobile://redirect"), &policy),
            Decision::Allowed
        );
        assert_eq!(classify(Some("exp://192.168.1.4:8081"), &policy), Decision::Allowed);
        assert_eq!(classify(Some("othermobile://x"), &policy), Decision::Blocked);
    }

    #[test]
    fn test_loopback_allowed_only_when_not_strict() {
        let mut policy = strict_policy();
        assert_eq!(classify(Some("http://localhost:3000"), &policy), Decision::Blocked);

        policy.strict = false;
        assert_eq!(classify(Some("http://localhost:3000"), &policy), Decision::Allowed);
        assert_eq!(classify(Some("http://192.168.1.7:8080"), &policy), Decision::Allowed);
    }
}
