//! Session cookie handling and caller resolution
//!
//! Every authenticated request ends in one canonical identity, whether it
//! arrived with a signed session cookie (browser) or a bearer token
//! (mobile). Handlers receive the identity explicitly and never consult
//! ambient state.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde::Serialize;
use tower_cookies::{Cookie, Cookies, Key};

use nopass_core::{TokenClaims, TokenService};

use crate::email::MailSender;
use crate::error::VaultError;
use crate::state::AppState;
use crate::store::{Identity, Session, SessionId, SessionStore, VaultStore};

use super::PublicIdentity;

const SESSION_COOKIE: &str = "nopass_session";

/// Helper to get the current session from the signed cookie jar
pub fn get_session_from_cookies<N: SessionStore>(
    cookies: &Cookies,
    key: &Key,
    session_store: &N,
) -> Option<Session> {
    cookies.signed(key).get(SESSION_COOKIE).and_then(|c| {
        let session_id = SessionId(c.value().to_string());
        session_store.get(&session_id).ok().flatten()
    })
}

/// Helper to set the signed session cookie
pub fn set_session_cookie(cookies: &Cookies, key: &Key, session_id: &str) {
    let cookie = Cookie::build((SESSION_COOKIE, session_id.to_string()))
        .path("/")
        .http_only(true)
        .build();
    cookies.signed(key).add(cookie);
}

/// Helper to clear the session cookie
pub fn clear_session_cookie(cookies: &Cookies, key: &Key) {
    let cookie = Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .max_age(tower_cookies::cookie::time::Duration::ZERO)
        .build();
    cookies.signed(key).add(cookie);
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// Verify the Authorization header and return its claims
///
/// Missing header → [`VaultError::NotAuthenticated`]; an expired token and
/// a bad signature are reported as distinct errors.
pub fn resolve_bearer_claims(
    tokens: &TokenService,
    headers: &HeaderMap,
) -> Result<TokenClaims, VaultError> {
    let token = bearer_token(headers).ok_or(VaultError::NotAuthenticated)?;
    Ok(tokens.verify(token)?)
}

/// Resolve the session cookie into a verified identity
pub fn resolve_session_identity<S, N, M>(
    state: &AppState<S, N, M>,
    cookies: &Cookies,
) -> Result<Identity, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let session = get_session_from_cookies(cookies, &state.cookie_key, &state.session_store)
        .ok_or(VaultError::NotAuthenticated)?;

    state
        .store
        .get_identity_by_email(&session.email)?
        .ok_or(VaultError::NotAuthenticated)
}

/// Resolve the caller through either auth mechanism
///
/// Session cookie first, then bearer token. Both paths end in the same
/// canonical identity record.
pub fn resolve_caller<S, N, M>(
    state: &AppState<S, N, M>,
    cookies: &Cookies,
    headers: &HeaderMap,
) -> Result<Identity, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    if let Ok(identity) = resolve_session_identity(state, cookies) {
        return Ok(identity);
    }

    let claims = resolve_bearer_claims(&state.tokens, headers)?;
    if let Some(identity) = state.store.get_identity_by_id(&claims.sub)? {
        return Ok(identity);
    }
    state
        .store
        .get_identity_by_email(&claims.email)?
        .ok_or(VaultError::UserNotFound)
}

#[derive(Serialize)]
pub struct SessionContext {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicIdentity>,
    pub server_time: i64,
}

/// GET /api/auth/session
pub async fn session_context<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
) -> Json<SessionContext>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let user = resolve_session_identity(&state, &cookies)
        .ok()
        .map(|identity| PublicIdentity::from(&identity));

    Json(SessionContext {
        authenticated: user.is_some(),
        user,
        server_time: chrono::Utc::now().timestamp(),
    })
}
