//! Local-credential login (web-facing, non-session)

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use nopass_core::verify_password;

use crate::email::MailSender;
use crate::error::VaultError;
use crate::state::AppState;
use crate::store::{Identity, SessionStore, VaultStore};

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct LoginUser {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: LoginUser,
}

/// Check local credentials and refresh the last-login timestamp
///
/// "User not found" and "Invalid password" are deliberately distinct
/// responses, matching the product's existing behavior.
pub(super) fn verify_credentials<S: VaultStore>(
    store: &S,
    email: &str,
    password: &str,
) -> Result<Identity, VaultError> {
    let identity = store
        .get_identity_by_email(email)?
        .ok_or(VaultError::UserNotFound)?;

    let hash = identity
        .password_hash
        .as_deref()
        .ok_or(VaultError::OAuthOnlyAccount)?;

    let valid = verify_password(password, hash)
        .map_err(|e| VaultError::Internal(e.to_string()))?;
    if !valid {
        return Err(VaultError::InvalidPassword);
    }

    store.touch_last_login(&identity.email)?;
    Ok(identity)
}

/// POST /api/login
pub async fn login<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, VaultError>
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

    // Minimal profile only; the hash never leaves the store layer
    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        user: LoginUser {
            id: identity.id,
            name: identity.name,
            email: identity.email,
        },
    }))
}
