//! Storage abstractions for the vault
//!
//! Two collections (identities, secret records) plus ephemeral sessions.
//! Every record operation takes the owner email as an explicit parameter;
//! list/update/delete filters are `(id AND owner)`, so a matching id with
//! the wrong owner behaves exactly like a missing record.

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::{InMemorySessionStore, InMemoryVaultStore};
pub use models::*;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::VaultError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, VaultError>;

/// Trait for identity and secret-record storage
pub trait VaultStore: Send + Sync {
    /// Create a new identity; fails if the email is already registered
    fn create_identity(&self, new: NewIdentity) -> StoreResult<Identity>;

    /// Look up an identity by email
    fn get_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Look up an identity by its stable id
    fn get_identity_by_id(&self, id: &str) -> StoreResult<Option<Identity>>;

    /// Refresh the last-successful-authentication timestamp
    fn touch_last_login(&self, email: &str) -> StoreResult<()>;

    /// Replace the stored password hash
    fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<()>;

    /// Create-or-refresh an identity on federated sign-in
    ///
    /// First sign-in creates the identity with the provider tag, profile
    /// name/avatar and no password hash. Subsequent sign-ins only refresh
    /// `last_login`; name and avatar are append-only bootstrap data and
    /// are never overwritten.
    fn upsert_federated_identity(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        provider: Provider,
    ) -> StoreResult<Identity>;

    /// Store a reset-token digest and its absolute expiry
    fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Find the identity holding an unexpired reset-token digest
    fn find_identity_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>>;

    /// Clear the reset-token fields (single-use semantics)
    fn clear_reset_token(&self, email: &str) -> StoreResult<()>;

    /// Create a password record for its owner
    fn create_password_record(&self, new: PasswordChanges, owner: &str)
        -> StoreResult<PasswordRecord>;

    /// List password records owned by `owner`, newest first
    fn list_password_records(&self, owner: &str) -> StoreResult<Vec<PasswordRecord>>;

    /// Count password records owned by `owner`
    fn count_password_records(&self, owner: &str) -> StoreResult<u64>;

    /// Update a password record; `None` when the id does not exist for
    /// this owner
    fn update_password_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: PasswordChanges,
    ) -> StoreResult<Option<PasswordRecord>>;

    /// Delete a password record; `false` when the id does not exist for
    /// this owner
    fn delete_password_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool>;

    /// Create a card record for its owner
    fn create_card_record(&self, new: CardChanges, owner: &str) -> StoreResult<CardRecord>;

    /// List card records owned by `owner`, newest first
    fn list_card_records(&self, owner: &str) -> StoreResult<Vec<CardRecord>>;

    /// Count card records owned by `owner`
    fn count_card_records(&self, owner: &str) -> StoreResult<u64>;

    /// Update a card record; `None` when the id does not exist for this
    /// owner
    fn update_card_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: CardChanges,
    ) -> StoreResult<Option<CardRecord>>;

    /// Delete a card record; `false` when the id does not exist for this
    /// owner
    fn delete_card_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool>;
}

/// Trait for session storage
pub trait SessionStore: Send + Sync {
    /// Create a new session for an identity
    fn create(&self, email: &str) -> StoreResult<Session>;

    /// Get a session by ID
    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>>;

    /// Delete a session
    fn delete(&self, session_id: &SessionId) -> StoreResult<()>;
}
