//! Password-record CRUD, owner-scoped
//!
//! The secret value is encrypted before it reaches the store and only
//! decrypted for its owner. The owning identity always comes from the
//! resolved caller; nothing in the payload can change it.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_cookies::Cookies;

use nopass_core::FieldCipher;

use crate::email::MailSender;
use crate::error::{FieldIssue, VaultError};
use crate::state::AppState;
use crate::store::{PasswordChanges, PasswordRecord, RecordId, SessionStore, VaultStore};

use super::session::resolve_session_identity;

#[derive(Deserialize)]
pub struct PasswordPayload {
    pub website: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordUpdatePayload {
    pub id: Option<String>,
    #[serde(flatten)]
    pub payload: PasswordPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordOut {
    pub id: String,
    pub website: String,
    pub username: String,
    /// Decrypted for the owner; the stored form is the envelope
    pub password: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub count_only: Option<String>,
}

#[derive(Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Check the payload and encrypt the secret field
pub(super) fn validate_and_encrypt(
    cipher: &FieldCipher,
    payload: &PasswordPayload,
) -> Result<PasswordChanges, VaultError> {
    let mut issues = Vec::new();
    if payload.website.as_deref().unwrap_or("").is_empty() {
        issues.push(FieldIssue { field: "website", message: "Website name required" });
    }
    if payload.username.as_deref().unwrap_or("").is_empty() {
        issues.push(FieldIssue { field: "username", message: "Username required" });
    }
    if payload.password.as_deref().unwrap_or("").is_empty() {
        issues.push(FieldIssue { field: "password", message: "Password required" });
    }
    if !issues.is_empty() {
        return Err(VaultError::Validation(issues));
    }

    Ok(PasswordChanges {
        website: payload.website.clone().unwrap_or_default(),
        username: payload.username.clone().unwrap_or_default(),
        password_encrypted: cipher.encrypt(payload.password.as_deref().unwrap_or(""))?,
        notes: payload.notes.clone(),
    })
}

pub(super) fn password_out(
    cipher: &FieldCipher,
    record: &PasswordRecord,
) -> Result<PasswordOut, VaultError> {
    Ok(PasswordOut {
        id: record.id.0.clone(),
        website: record.website.clone(),
        username: record.username.clone(),
        password: cipher.decrypt(&record.password_encrypted)?,
        notes: record.notes.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// POST /api/password
pub async fn create<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Json(payload): Json<PasswordPayload>,
) -> Result<(StatusCode, Json<DataResponse<PasswordOut>>), VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;
    let changes = validate_and_encrypt(&state.cipher, &payload)?;

    let record = state
        .store
        .create_password_record(changes, &identity.email)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            success: true,
            data: password_out(&state.cipher, &record)?,
        }),
    ))
}

/// GET /api/password
pub async fn list<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Query(query): Query<ListQuery>,
) -> Result<Response, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;

    // Count-only path never touches the cipher
    if query.count_only.as_deref() == Some("true") {
        let count = state.store.count_password_records(&identity.email)?;
        return Ok(Json(CountResponse { count }).into_response());
    }

    let records = state.store.list_password_records(&identity.email)?;
    let data = records
        .iter()
        .map(|r| password_out(&state.cipher, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { success: true, data }).into_response())
}

/// PUT /api/password
pub async fn update<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Json(body): Json<PasswordUpdatePayload>,
) -> Result<Json<DataResponse<PasswordOut>>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;

    let id = body
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing password ID"))?;
    let changes = validate_and_encrypt(&state.cipher, &body.payload)?;

    let record = state
        .store
        .update_password_record(&RecordId(id.to_string()), &identity.email, changes)?
        .ok_or(VaultError::RecordNotFound("Password"))?;

    Ok(Json(DataResponse {
        success: true,
        data: password_out(&state.cipher, &record)?,
    }))
}

/// DELETE /api/password?id=...
pub async fn remove<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;

    let id = query
        .id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(VaultError::MissingField("Missing password ID"))?;

    let deleted = state
        .store
        .delete_password_record(&RecordId(id.to_string()), &identity.email)?;
    if !deleted {
        return Err(VaultError::RecordNotFound("Password"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}
