//! Data models for vault storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an identity was first established
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Local email + password registration
    Credentials,
    /// Federated sign-in through Google
    Google,
    /// Federated sign-in through GitHub
    Github,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Credentials => "credentials",
            Provider::Google => "google",
            Provider::Github => "github",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "credentials" => Some(Provider::Credentials),
            "google" => Some(Provider::Google),
            "github" => Some(Provider::Github),
            _ => None,
        }
    }
}

/// Unique secret-record identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

/// Unique session identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// One human user
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: String,
    /// Globally unique, stored lowercased and trimmed
    pub email: String,
    pub name: Option<String>,
    /// Absent for identities created through a federated provider
    pub password_hash: Option<String>,
    pub provider: Provider,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// SHA-256 digest of the outstanding reset token, if any
    pub reset_token_hash: Option<String>,
    pub reset_token_expires: Option<DateTime<Utc>>,
}

/// Fields for creating an identity
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub provider: Provider,
    pub image: Option<String>,
}

/// A stored password entry; the secret value is an encrypted envelope
#[derive(Debug, Clone)]
pub struct PasswordRecord {
    pub id: RecordId,
    pub website: String,
    pub username: String,
    pub password_encrypted: String,
    pub notes: Option<String>,
    /// Set once at creation from the authenticated caller
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields of a password entry
#[derive(Debug, Clone)]
pub struct PasswordChanges {
    pub website: String,
    pub username: String,
    pub password_encrypted: String,
    pub notes: Option<String>,
}

/// A stored payment-card entry; number and security code are encrypted
/// envelopes, the last-4 digits are kept in clear for display masking
#[derive(Debug, Clone)]
pub struct CardRecord {
    pub id: RecordId,
    pub cardholder_name: String,
    pub card_number_encrypted: String,
    pub card_number_last4: String,
    pub expiry_date: String,
    pub cvv_encrypted: String,
    pub notes: Option<String>,
    pub owner_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable fields of a card entry
#[derive(Debug, Clone)]
pub struct CardChanges {
    pub cardholder_name: String,
    pub card_number_encrypted: String,
    pub card_number_last4: String,
    pub expiry_date: String,
    pub cvv_encrypted: String,
    pub notes: Option<String>,
}

/// A browser session
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
