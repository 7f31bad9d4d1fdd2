//! Card-record CRUD, owner-scoped
//!
//! Number and security code are encrypted; the last-4 digits are derived
//! from the plaintext at write time and stored in clear for masking.

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
use crate::store::{CardChanges, CardRecord, RecordId, SessionStore, VaultStore};

use super::passwords::{CountResponse, DataResponse, IdQuery, ListQuery};
use super::session::resolve_session_identity;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPayload {
    pub cardholder_name: Option<String>,
    pub card_number: Option<String>,
    pub expiry_date: Option<String>,
    pub cvv: Option<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize)]
pub struct CardUpdatePayload {
    pub id: Option<String>,
    #[serde(flatten)]
    pub payload: CardPayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardOut {
    pub id: String,
    pub cardholder_name: String,
    /// Decrypted full number; the UI decides mask/unmask
    pub card_number: String,
    pub card_number_last4: String,
    pub expiry_date: String,
    pub cvv: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Last 4 characters of the number as entered (formatting preserved)
fn last4(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    chars[chars.len().saturating_sub(4)..].iter().collect()
}

/// Check the payload, derive the last-4 and encrypt the secret fields
pub(super) fn validate_and_encrypt(
    cipher: &FieldCipher,
    payload: &CardPayload,
) -> Result<CardChanges, VaultError> {
    let mut issues = Vec::new();
    if payload.cardholder_name.as_deref().unwrap_or("").is_empty() {
        issues.push(FieldIssue { field: "cardholderName", message: "Cardholder name is required." });
    }
    if payload.card_number.as_deref().unwrap_or("").len() < 12 {
        issues.push(FieldIssue { field: "cardNumber", message: "Card number is too short." });
    }
    if payload.expiry_date.as_deref().unwrap_or("").len() < 3 {
        issues.push(FieldIssue { field: "expiryDate", message: "Expiry date required." });
    }
    if payload.cvv.as_deref().unwrap_or("").len() < 3 {
        issues.push(FieldIssue { field: "cvv", message: "CVV required." });
    }
    if !issues.is_empty() {
        return Err(VaultError::Validation(issues));
    }

    let card_number = payload.card_number.as_deref().unwrap_or("");
    Ok(CardChanges {
        cardholder_name: payload.cardholder_name.clone().unwrap_or_default(),
        card_number_encrypted: cipher.encrypt(card_number)?,
        card_number_last4: last4(card_number),
        expiry_date: payload.expiry_date.clone().unwrap_or_default(),
        cvv_encrypted: cipher.encrypt(payload.cvv.as_deref().unwrap_or(""))?,
        notes: payload.notes.clone(),
    })
}

pub(super) fn card_out(cipher: &FieldCipher, record: &CardRecord) -> Result<CardOut, VaultError> {
    Ok(CardOut {
        id: record.id.0.clone(),
        cardholder_name: record.cardholder_name.clone(),
        card_number: cipher.decrypt(&record.card_number_encrypted)?,
        card_number_last4: record.card_number_last4.clone(),
        expiry_date: record.expiry_date.clone(),
        cvv: cipher.decrypt(&record.cvv_encrypted)?,
        notes: record.notes.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// POST /api/card
pub async fn create<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Json(payload): Json<CardPayload>,
) -> Result<(StatusCode, Json<DataResponse<CardOut>>), VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let identity = resolve_session_identity(&state, &cookies)?;
    let changes = validate_and_encrypt(&state.cipher, &payload)?;

    let record = state.store.create_card_record(changes, &identity.email)?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            success: true,
            data: card_out(&state.cipher, &record)?,
        }),
    ))
}

/// GET /api/card
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

    if query.count_only.as_deref() == Some("true") {
        let count = state.store.count_card_records(&identity.email)?;
        return Ok(Json(CountResponse { count }).into_response());
    }

    let records = state.store.list_card_records(&identity.email)?;
    let data = records
        .iter()
        .map(|r| card_out(&state.cipher, r))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(DataResponse { success: true, data }).into_response())
}

/// PUT /api/card
pub async fn update<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    cookies: Cookies,
    Json(body): Json<CardUpdatePayload>,
) -> Result<Json<DataResponse<CardOut>>, VaultError>
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
        .ok_or(VaultError::MissingField("Missing card ID"))?;
    let changes = validate_and_encrypt(&state.cipher, &body.payload)?;

    let record = state
        .store
        .update_card_record(&RecordId(id.to_string()), &identity.email, changes)?
        .ok_or(VaultError::RecordNotFound("Card"))?;

    Ok(Json(DataResponse {
        success: true,
        data: card_out(&state.cipher, &record)?,
    }))
}

/// DELETE /api/card?id=...
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
        .ok_or(VaultError::MissingField("Missing card ID"))?;

    let deleted = state
        .store
        .delete_card_record(&RecordId(id.to_string()), &identity.email)?;
    if !deleted {
        return Err(VaultError::RecordNotFound("Card"));
    }

    Ok(Json(serde_json::json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::last4;

    #[test]
    fn test_last4_preserves_formatting() {
        assert_eq!(last4("4111111111111111"), "1111");
        assert_eq!(last4("4111 1111 1111 1234"), "1234");
        assert_eq!(last4("abc"), "abc");
    }
}
