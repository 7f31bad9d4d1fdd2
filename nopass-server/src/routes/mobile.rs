//! Mobile client endpoints
//!
//! Mobile requests authenticate with a bearer token instead of a session
//! cookie. Record access is scoped to the email inside the verified token;
//! the query string can never choose a different owner.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use crate::config::OAuthClientConfig;
use crate::email::MailSender;
use crate::error::VaultError;
use crate::oauth::{self, OAuthProviderKind};
use crate::state::AppState;
use crate::store::{Identity, RecordId, SessionStore, VaultStore};

use super::cards::{self, CardPayload, CardUpdatePayload};
use super::login::verify_credentials;
use super::passwords::{
    self, DataResponse, IdQuery, ListQuery, PasswordPayload, PasswordUpdatePayload,
};
use super::session::{resolve_bearer_claims, resolve_caller};
use super::PublicIdentity;

/// Mobile password login issues a 7-day token
const PASSWORD_LOGIN_TTL_DAYS: i64 = 7;
/// Federated mobile login issues a 30-day token
const FEDERATED_LOGIN_TTL_DAYS: i64 = 30;

/// Resolve the bearer token into the owning identity's email
fn bearer_owner<S, N, M>(
    state: &AppState<S, N, M>,
    headers: &HeaderMap,
) -> Result<String, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let claims = resolve_bearer_claims(&state.tokens, headers)?;
    Ok(claims.email)
}

#[derive(Deserialize)]
pub struct MobileLoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct MobileLoginResponse {
    pub success: bool,
    pub user: PublicIdentity,
    pub token: String,
}

/// POST /api/mobile-login
pub async fn mobile_login<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Json(req): Json<MobileLoginRequest>,
) -> Result<Json<MobileLoginResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let (email, password) = match (req.email.as_deref(), req.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(VaultError::MissingField("Missing email or password")),
    };

    let identity = verify_credentials(&state.store, email, password)?;

    let token = state.tokens.issue(
        &identity.id,
        &identity.email,
        Duration::days(PASSWORD_LOGIN_TTL_DAYS),
    )?;

    // Re-read so the response carries the refreshed last-login
    let identity = state
        .store
        .get_identity_by_email(&identity.email)?
        .unwrap_or(identity);

    Ok(Json(MobileLoginResponse {
        success: true,
        user: PublicIdentity::from(&identity),
        token,
    }))
}

/// GET /api/mobile-passwords
pub async fn list_passwords<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    if query.count_only.as_deref() == Some("true") {
        let count = state.store.count_password_records(&owner)?;
        return Ok(Json(serde_json::json!({ "success": true, "count": count })).into_response());
    }

    let records = state.store.list_password_records(&owner)?;
    let data = records
        .iter()
        .map(|r| passwords::password_out(&state.cipher, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { success: true, data }).into_response())
}

/// POST /api/mobile-passwords
pub async fn create_password<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Json(payload): Json<PasswordPayload>,
) -> Result<(StatusCode, Response), VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;
    let changes = passwords::validate_and_encrypt(&state.cipher, &payload)?;

    let record = state.store.create_password_record(changes, &owner)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            success: true,
            data: passwords::password_out(&state.cipher, &record)?,
        })
        .into_response(),
    ))
}

/// PUT /api/mobile-passwords
pub async fn update_password<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Json(body): Json<PasswordUpdatePayload>,
) -> Result<Response, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    let id = body
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing password ID"))?;
    let changes = passwords::validate_and_encrypt(&state.cipher, &body.payload)?;

    let record = state
        .store
        .update_password_record(&RecordId(id.to_string()), &owner, changes)?
        .ok_or(VaultError::RecordNotFound("Password"))?;

    Ok(Json(DataResponse {
        success: true,
        data: passwords::password_out(&state.cipher, &record)?,
    })
    .into_response())
}

/// DELETE /api/mobile-passwords?id=...
pub async fn remove_password<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    let id = query
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing params"))?;

    let deleted = state
        .store
        .delete_password_record(&RecordId(id.to_string()), &owner)?;
    if !deleted {
        return Err(VaultError::RecordNotFound("Password"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

/// GET /api/mobile-cards
pub async fn list_cards<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    if query.count_only.as_deref() == Some("true") {
        let count = state.store.count_card_records(&owner)?;
        return Ok(Json(serde_json::json!({ "success": true, "count": count })).into_response());
    }

    let records = state.store.list_card_records(&owner)?;
    let data = records
        .iter()
        .map(|r| cards::card_out(&state.cipher, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { success: true, data }).into_response())
}

/// POST /api/mobile-cards
pub async fn create_card<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Json(payload): Json<CardPayload>,
) -> Result<(StatusCode, Response), VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;
    let changes = cards::validate_and_encrypt(&state.cipher, &payload)?;

    let record = state.store.create_card_record(changes, &owner)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            success: true,
            data: cards::card_out(&state.cipher, &record)?,
        })
        .into_response(),
    ))
}

/// PUT /api/mobile-cards
pub async fn update_card<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Json(body): Json<CardUpdatePayload>,
) -> Result<Response, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    let id = body
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing card ID"))?;
    let changes = cards::validate_and_encrypt(&state.cipher, &body.payload)?;

    let record = state
        .store
        .update_card_record(&RecordId(id.to_string()), &owner, changes)?
        .ok_or(VaultError::RecordNotFound("Card"))?;

    Ok(Json(DataResponse {
        success: true,
        data: cards::card_out(&state.cipher, &record)?,
    })
    .into_response())
}

/// DELETE /api/mobile-cards?id=...
pub async fn remove_card<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let owner = bearer_owner(&state, &headers)?;

    let id = query
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing params"))?;

    let deleted = state
        .store
        .delete_card_record(&RecordId(id.to_string()), &owner)?;
    if !deleted {
        return Err(VaultError::RecordNotFound("Card"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct MobileCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

fn mobile_oauth_config<'a>(
    kind: OAuthProviderKind,
    config: &'a crate::config::Config,
) -> Result<&'a OAuthClientConfig, VaultError> {
    let client = match kind {
        OAuthProviderKind::Google => config.google_mobile.as_ref(),
        OAuthProviderKind::Github => config.github_mobile.as_ref(),
    };
    client.ok_or_else(|| {
        VaultError::Internal(format!("{} mobile OAuth is not configured", kind.name()))
    })
}

fn mobile_callback_uri(kind: OAuthProviderKind, base_url: &str) -> String {
    let path = match kind {
        OAuthProviderKind::Google => "mobile-google-auth",
        OAuthProviderKind::Github => "mobile-github-auth",
    };
    format!("{}/api/{}", base_url.trim_end_matches('/'), path)
}

async fn start_mobile_flow<S, N, M>(
    state: &AppState<S, N, M>,
    kind: OAuthProviderKind,
    next: Option<&str>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let client = mobile_oauth_config(kind, &state.config)?;
    let redirect_uri = mobile_callback_uri(kind, &state.config.base_url);

    // State carries the app deep link to land on after the exchange
    let next = next.unwrap_or(&state.config.mobile_redirect_scheme);
    let authorize = oauth::authorize_url(kind, &client.client_id, &redirect_uri, next)?;

    Ok(Redirect::temporary(&authorize))
}

async fn complete_mobile_flow<S, N, M>(
    state: &AppState<S, N, M>,
    kind: OAuthProviderKind,
    query: MobileCallbackQuery,
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

    let client = mobile_oauth_config(kind, &state.config)?;
    let redirect_uri = mobile_callback_uri(kind, &state.config.base_url);

    let profile =
        oauth::exchange_code(&state.http, kind, client, code, &redirect_uri).await?;

    let identity = state.store.upsert_federated_identity(
        &profile.email,
        profile.name.as_deref(),
        profile.image.as_deref(),
        kind.provider(),
    )?;

    let token = state.tokens.issue(
        &identity.id,
        &identity.email,
        Duration::days(FEDERATED_LOGIN_TTL_DAYS),
    )?;

    tracing::info!(email = %identity.email, provider = kind.name(), "Federated mobile sign-in");

    // Back into the app with the token in the deep link
    let target = query
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(&state.config.mobile_redirect_scheme);
    Ok(Redirect::temporary(&format!("{target}?token={token}")))
}

/// GET /api/mobile-google-start
pub async fn google_start<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<NextQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    start_mobile_flow(&state, OAuthProviderKind::Google, query.next.as_deref()).await
}

/// GET /api/mobile-google-auth
pub async fn google_auth<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<MobileCallbackQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    complete_mobile_flow(&state, OAuthProviderKind::Google, query).await
}

/// GET /api/mobile-github-start
pub async fn github_start<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<NextQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    start_mobile_flow(&state, OAuthProviderKind::Github, query.next.as_deref()).await
}

/// GET /api/mobile-github-auth
pub async fn github_auth<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Query(query): Query<MobileCallbackQuery>,
) -> Result<Redirect, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    complete_mobile_flow(&state, OAuthProviderKind::Github, query).await
}

#[derive(Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: PublicIdentity,
}

/// GET /api/mobile-me
///
/// Accepts either auth mechanism; both resolve to the same identity.
pub async fn me<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Json<MeResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity: Identity = resolve_caller(&state, &cookies, &headers)?;

    Ok(Json(MeResponse {
        success: true,
        user: PublicIdentity::from(&identity),
    }))
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicIdentity,
}

/// POST /api/mobile-validate
pub async fn validate<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let claims = resolve_bearer_claims(&state.tokens, &headers)?;

    let identity = state
        .store
        .get_identity_by_id(&claims.sub)?
        .ok_or(VaultError::UserNotFound)?;

    Ok(Json(ValidateResponse {
        success: true,
        message: "Token valid".to_string(),
        user: PublicIdentity::from(&identity),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mobile_callback_uri() {
        assert_eq!(
            mobile_callback_uri(OAuthProviderKind::Google, "https://vault.example.com/"),
            "https://vault.example.com/api/mobile-google-auth"
        );
        assert_eq!(
            mobile_callback_uri(OAuthProviderKind::Github, "https://vault.example.com"),
            "https://vault.example.com/api/mobile-github-auth"
        );
    }

}
