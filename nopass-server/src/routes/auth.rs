//! Session-based sign-in/out and web federated flows

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;
use url::Url;

use crate::config::OAuthClientConfig;
use crate::email::MailSender;
use crate::error::VaultError;
use crate::oauth::{self, OAuthProviderKind};
use crate::state::AppState;
use crate::store::{SessionStore, VaultStore};

use super::login::verify_credentials;
use super::session;

/// Validate a post-login redirect target
///
/// Relative targets resolve against the base URL. Absolute same-origin
/// targets are allowed unless they point back into the auth subsystem,
/// which would loop; those land on the application root. Everything else
/// falls back to the base URL.
pub fn safe_redirect_target(target: Option<&str>, base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');

    let Some(target) = target.filter(|t| !t.is_empty()) else {
        return base.to_string();
    };

    if target.starts_with('/') {
        return format!("{base}{target}");
    }

    if let (Ok(dest), Ok(origin)) = (Url::parse(target), Url::parse(base)) {
        if dest.origin() == origin.origin() {
            if dest.path().starts_with("/api/auth/") {
                return base.to_string();
            }
            return target.to_string();
        }
    }

    base.to_string()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub callback_url: Option<String>,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub success: bool,
    pub url: String,
}

/// POST /api/auth/sign-in
pub async fn sign_in<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let (email, password) = match (req.email.as_deref(), req.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(VaultError::MissingField("Missing credentials")),
    };

    let identity = verify_credentials(&state.store, email, password)?;

    let new_session = state.session_store.create(&identity.email)?;
    session::set_session_cookie(&cookies, &state.cookie_key, &new_session.id.0);

    Ok(Json(SignInResponse {
        success: true,
        url: safe_redirect_target(req.callback_url.as_deref(), &state.config.base_url),
    }))
}

#[derive(Serialize)]
pub struct SignOutResponse {
    pub success: bool,
}

/// POST /api/auth/sign-out
pub async fn sign_out<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
) -> Json<SignOutResponse>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    if let Some(current) =
        session::get_session_from_cookies(&cookies, &state.cookie_key, &state.session_store)
    {
        let _ = state.session_store.delete(&current.id);
    }

    session::clear_session_cookie(&cookies, &state.cookie_key);

    Json(SignOutResponse { success: true })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQuery {
    pub callback_url: Option<String>,
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn web_oauth_config<'a>(
    kind: OAuthProviderKind,
    config: &'a crate::config::Config,
) -> Result<&'a OAuthClientConfig, VaultError> {
    let client = match kind {
        OAuthProviderKind::Google => config.google.as_ref(),
        OAuthProviderKind::Github => config.github.as_ref(),
    };
    client.ok_or_else(|| {
        VaultError::Internal(format!("{} OAuth is not configured", kind.name()))
    })
}

fn web_callback_uri(kind: OAuthProviderKind, base_url: &str) -> String {
    let path = match kind {
        OAuthProviderKind::Google => "google",
        OAuthProviderKind::Github => "github",
    };
    format!("{}/api/auth/{}/callback", base_url.trim_end_matches('/'), path)
}

async fn start_web_flow<S, N, M>(
    state: &AppState<S, N, M>,
    kind: OAuthProviderKind,
    callback_url: Option<&str>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let client = web_oauth_config(kind, &state.config)?;
    let redirect_uri = web_callback_uri(kind, &state.config.base_url);

    // The provider echoes the state back; it carries the post-login target
    let authorize = oauth::authorize_url(
        kind,
        &client.client_id,
        &redirect_uri,
        callback_url.unwrap_or("/"),
    )?;

    Ok(Redirect::temporary(&authorize))
}

async fn complete_web_flow<S, N, M>(
    state: &AppState<S, N, M>,
    cookies: &Cookies,
    kind: OAuthProviderKind,
    query: CallbackQuery,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or(VaultError::MissingField("Missing code"))?;

    let client = web_oauth_config(kind, &state.config)?;
    let redirect_uri = web_callback_uri(kind, &state.config.base_url);

    let profile =
        oauth::exchange_code(&state.http, kind, client, code, &redirect_uri).await?;

    let identity = state.store.upsert_federated_identity(
        &profile.email,
        profile.name.as_deref(),
        profile.image.as_deref(),
        kind.provider(),
    )?;

    let new_session = state.session_store.create(&identity.email)?;
    session::set_session_cookie(cookies, &state.cookie_key, &new_session.id.0);

    tracing::info!(email = %identity.email, provider = kind.name(), "Federated sign-in");

    let target = safe_redirect_target(query.state.as_deref(), &state.config.base_url);
    Ok(Redirect::temporary(&target))
}

/// GET /api/auth/google/start
pub async fn google_start<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<StartQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    start_web_flow(&state, OAuthProviderKind::Google, query.callback_url.as_deref()).await
}

/// GET /api/auth/google/callback
pub async fn google_callback<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    complete_web_flow(&state, &cookies, OAuthProviderKind::Google, query).await
}

/// GET /api/auth/github/start
pub async fn github_start<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<StartQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    start_web_flow(&state, OAuthProviderKind::Github, query.callback_url.as_deref()).await
}

/// GET /api/auth/github/callback
pub async fn github_callback<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Query(query): Query<CallbackQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    complete_web_flow(&state, &cookies, OAuthProviderKind::Github, query).await
}
