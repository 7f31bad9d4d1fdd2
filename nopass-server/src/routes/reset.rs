//! Password reset endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use nopass_core::reset::{self, ResetToken, RESET_TOKEN_TTL_MINUTES};
use nopass_core::hash_password;

use crate::email::MailSender;
use crate::error::VaultError;
use crate::state::AppState;
use crate::store::{SessionStore, VaultStore};

use super::register::check_password_policy;

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: Option<String>,
}

#[derive(Serialize)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

/// POST /api/auth/forgot-password
///
/// Issues a single-use reset token and mails the link. Only the token
/// digest is persisted; an unknown email sends nothing and returns 404.
pub async fn forgot_password<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ForgotPasswordResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let email = req
        .email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or(VaultError::MissingField("Email is required"))?;

    let identity = state
        .store
        .get_identity_by_email(email)?
        .ok_or(VaultError::EmailNotFound)?;

    let token = ResetToken::generate();
    let expires = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    state
        .store
        .set_reset_token(&identity.email, &token.hash, expires)?;

    let reset_link = format!(
        "{}/reset-password?token={}",
        state.config.base_url, token.raw
    );

    state
        .mail_sender
        .send_reset(&identity.email, &reset_link)
        .map_err(VaultError::Internal)?;

    Ok(Json(ForgotPasswordResponse {
        message: "Password reset link sent! Check your email.".to_string(),
    }))
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct ResetPasswordResponse {
    pub message: String,
}

/// POST /api/auth/reset-password
///
/// Consumes the reset token: the digest must match an identity with an
/// unexpired expiry, and both fields are cleared on success so the token
/// cannot be replayed.
pub async fn reset_password<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ResetPasswordResponse>, VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let (token, password) = match (req.token.as_deref(), req.password.as_deref()) {
        (Some(t), Some(p)) if !t.is_empty() && !p.is_empty() => (t, p),
        _ => return Err(VaultError::MissingField("Invalid request.")),
    };

    check_password_policy(password)?;

    let token_hash = reset::hash_token(token);
    let identity = state
        .store
        .find_identity_by_reset_token(&token_hash, Utc::now())?
        .ok_or(VaultError::InvalidResetToken)?;

    let password_hash = hash_password(password)
        .map_err(|e| VaultError::Internal(e.to_string()))?;

    state.store.set_password_hash(&identity.email, &password_hash)?;
    state.store.clear_reset_token(&identity.email)?;

    tracing::info!(email = %identity.email, "Password reset completed");

    Ok(Json(ResetPasswordResponse {
        message: "Password reset successful. You can now login.".to_string(),
    }))
}
