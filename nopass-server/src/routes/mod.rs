//! HTTP routes for the vault

mod auth;
mod cards;
mod login;
mod mobile;
mod passwords;
mod register;
mod reset;
mod session;
mod user;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;

use crate::email::MailSender;
use crate::origin::{self, OriginPolicy};
use crate::state::AppState;
use crate::store::{Identity, SessionStore, VaultStore};

/// Identity fields exposed to clients; never includes the password hash
/// or reset-token material
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicIdentity {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub provider: String,
    pub image: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Identity> for PublicIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.name.clone(),
            email: identity.email.clone(),
            provider: identity.provider.as_str().to_string(),
            image: identity.image.clone(),
            last_login: identity.last_login,
            created_at: identity.created_at,
        }
    }
}

/// Create the router with all routes
pub fn create_router<S, N, M>(state: Arc<AppState<S, N, M>>) -> Router
where
    S: VaultStore + 'static,
    N: SessionStore + 'static,
    M: MailSender + 'static,
{
    let policy = Arc::new(OriginPolicy {
        allowed_origins: state.config.allowed_origins.clone(),
        allowed_mobile_schemes: state.config.allowed_mobile_schemes.clone(),
        strict: state.config.strict_origin_check,
        hsts: state.config.hsts,
    });

    Router::new()
        .route("/api/register", post(register::register))
        .route("/api/login", post(login::login))
        .route("/api/auth/session", get(session::session_context))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/auth/google/start", get(auth::google_start))
        .route("/api/auth/google/callback", get(auth::google_callback))
        .route("/api/auth/github/start", get(auth::github_start))
        .route("/api/auth/github/callback", get(auth::github_callback))
        .route("/api/auth/forgot-password", post(reset::forgot_password))
        .route("/api/auth/reset-password", post(reset::reset_password))
        .route(
            "/api/password",
            get(passwords::list)
                .post(passwords::create)
                .put(passwords::update)
                .delete(passwords::remove),
        )
        .route(
            "/api/card",
            get(cards::list)
                .post(cards::create)
                .put(cards::update)
                .delete(cards::remove),
        )
        .route("/api/mobile-login", post(mobile::mobile_login))
        .route(
            "/api/mobile-passwords",
            get(mobile::list_passwords)
                .post(mobile::create_password)
                .put(mobile::update_password)
                .delete(mobile::remove_password),
        )
        .route(
            "/api/mobile-cards",
            get(mobile::list_cards)
                .post(mobile::create_card)
                .put(mobile::update_card)
                .delete(mobile::remove_card),
        )
        .route("/api/mobile-google-start", get(mobile::google_start))
        .route("/api/mobile-google-auth", get(mobile::google_auth))
        .route("/api/mobile-github-start", get(mobile::github_start))
        .route("/api/mobile-github-auth", get(mobile::github_auth))
        .route("/api/mobile-me", get(mobile::me))
        .route("/api/mobile-validate", post(mobile::validate))
        .route("/api/user", get(user::get_user))
        .layer(CookieManagerLayer::new())
        .layer(middleware::from_fn_with_state(policy, origin::gatekeeper))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
