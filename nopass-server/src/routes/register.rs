//! Local account registration

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use nopass_core::hash_password;

use crate::email::MailSender;
use crate::error::VaultError;
use crate::state::AppState;
use crate::store::{NewIdentity, Provider, SessionStore, VaultStore};

/// Minimum password length
pub(super) const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length
pub(super) const MAX_PASSWORD_LENGTH: usize = 80;

pub(super) fn check_password_policy(password: &str) -> Result<(), VaultError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(VaultError::PasswordTooShort);
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(VaultError::PasswordTooLong);
    }
    Ok(())
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterUser {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user: RegisterUser,
}

/// POST /api/register
pub async fn register<S, N, M>(
    State(state): State<Arc<AppState<S, N, M>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), VaultError>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    let (email, password) = match (req.email.as_deref(), req.password.as_deref()) {
        (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p),
        _ => return Err(VaultError::MissingField("Missing required fields")),
    };

    check_password_policy(password)?;

    // Reject duplicates before paying for the hash
    if state.store.get_identity_by_email(email)?.is_some() {
        return Err(VaultError::UserAlreadyExists);
    }

    let password_hash = hash_password(password)
        .map_err(|e| VaultError::Internal(e.to_string()))?;

    let identity = state.store.create_identity(NewIdentity {
        email: email.to_string(),
        name: req.name.clone(),
        password_hash: Some(password_hash),
        provider: Provider::Credentials,
        image: None,
    })?;

    tracing::info!(email = %identity.email, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user: RegisterUser {
                name: identity.name,
                email: identity.email,
            },
        }),
    ))
}
