//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// A field-level validation issue, reported with a 422 response
#[derive(Debug, Clone, Serialize)]
pub struct FieldIssue {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("No account found with this email")]
    EmailNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("This account does not use password login")]
    OAuthOnlyAccount,

    #[error("Unauthorized")]
    NotAuthenticated,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid or expired token.")]
    InvalidResetToken,

    #[error("{0} not found")]
    RecordNotFound(&'static str),

    #[error("{0}")]
    MissingField(&'static str),

    #[error("Password too short (minimum 8 characters)")]
    PasswordTooShort,

    #[error("Password too long (maximum 80 characters)")]
    PasswordTooLong,

    #[error("Invalid input")]
    Validation(Vec<FieldIssue>),

    #[error("Provider exchange failed: {0}")]
    OAuthExchange(String),

    #[error("Cryptographic failure")]
    Crypto,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    fn status(&self) -> StatusCode {
        match self {
            VaultError::UserNotFound | VaultError::EmailNotFound => StatusCode::NOT_FOUND,
            VaultError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            VaultError::UserAlreadyExists
            | VaultError::OAuthOnlyAccount
            | VaultError::InvalidResetToken
            | VaultError::MissingField(_)
            | VaultError::PasswordTooShort
            | VaultError::PasswordTooLong
            | VaultError::OAuthExchange(_) => StatusCode::BAD_REQUEST,
            VaultError::InvalidPassword
            | VaultError::NotAuthenticated
            | VaultError::InvalidToken
            | VaultError::TokenExpired => StatusCode::UNAUTHORIZED,
            VaultError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            VaultError::Crypto | VaultError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VaultError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match &self {
            VaultError::Validation(issues) => {
                json!({ "success": false, "message": "Invalid input", "issues": issues })
            }
            VaultError::Crypto => {
                tracing::error!("Cryptographic failure while handling request");
                json!({ "success": false, "message": "Server error" })
            }
            VaultError::Internal(detail) => {
                tracing::error!(%detail, "Internal error");
                json!({ "success": false, "message": "Server error" })
            }
            VaultError::OAuthExchange(detail) => {
                tracing::warn!(%detail, "Provider exchange failed");
                json!({ "success": false, "message": detail })
            }
            other => json!({ "success": false, "message": other.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<nopass_core::Error> for VaultError {
    fn from(e: nopass_core::Error) -> Self {
        match e {
            nopass_core::Error::TokenExpired => VaultError::TokenExpired,
            nopass_core::Error::InvalidToken => VaultError::InvalidToken,
            nopass_core::Error::MalformedEnvelope(_)
            | nopass_core::Error::DecryptionFailed
            | nopass_core::Error::EncryptionFailed => VaultError::Crypto,
            other => VaultError::Internal(other.to_string()),
        }
    }
}
