//! In-memory storage implementations

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CardChanges, CardRecord, Identity, NewIdentity, PasswordChanges, PasswordRecord, Provider,
    RecordId, Session, SessionId, SessionStore, StoreResult, VaultStore,
};
use crate::error::VaultError;

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

/// In-memory vault store
pub struct InMemoryVaultStore {
    identities: RwLock<HashMap<String, Identity>>,
    passwords: RwLock<HashMap<String, PasswordRecord>>,
    cards: RwLock<HashMap<String, CardRecord>>,
}

impl InMemoryVaultStore {
    pub fn new() -> Self {
        Self {
            identities: RwLock::new(HashMap::new()),
            passwords: RwLock::new(HashMap::new()),
            cards: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryVaultStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultStore for InMemoryVaultStore {
    fn create_identity(&self, new: NewIdentity) -> StoreResult<Identity> {
        let email = normalize(&new.email);
        let mut identities = self.identities.write().unwrap();
        if identities.contains_key(&email) {
            return Err(VaultError::UserAlreadyExists);
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: new.name,
            password_hash: new.password_hash,
            provider: new.provider,
            image: new.image,
            created_at: Utc::now(),
            last_login: None,
            reset_token_hash: None,
            reset_token_expires: None,
        };
        identities.insert(email, identity.clone());
        Ok(identity)
    }

    fn get_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        Ok(self.identities.read().unwrap().get(&normalize(email)).cloned())
    }

    fn get_identity_by_id(&self, id: &str) -> StoreResult<Option<Identity>> {
        Ok(self
            .identities
            .read()
            .unwrap()
            .values()
            .find(|i| i.id == id)
            .cloned())
    }

    fn touch_last_login(&self, email: &str) -> StoreResult<()> {
        let mut identities = self.identities.write().unwrap();
        match identities.get_mut(&normalize(email)) {
            Some(identity) => {
                identity.last_login = Some(Utc::now());
                Ok(())
            }
            None => Err(VaultError::UserNotFound),
        }
    }

    fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<()> {
        let mut identities = self.identities.write().unwrap();
        match identities.get_mut(&normalize(email)) {
            Some(identity) => {
                identity.password_hash = Some(password_hash.to_string());
                Ok(())
            }
            None => Err(VaultError::UserNotFound),
        }
    }

    fn upsert_federated_identity(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        provider: Provider,
    ) -> StoreResult<Identity> {
        let email = normalize(email);
        let mut identities = self.identities.write().unwrap();

        if let Some(identity) = identities.get_mut(&email) {
            identity.last_login = Some(Utc::now());
            return Ok(identity.clone());
        }

        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            name: name.map(str::to_string),
            password_hash: None,
            provider,
            image: image.map(str::to_string),
            created_at: Utc::now(),
            last_login: Some(Utc::now()),
            reset_token_hash: None,
            reset_token_expires: None,
        };
        identities.insert(email, identity.clone());
        Ok(identity)
    }

    fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut identities = self.identities.write().unwrap();
        match identities.get_mut(&normalize(email)) {
            Some(identity) => {
                identity.reset_token_hash = Some(token_hash.to_string());
                identity.reset_token_expires = Some(expires);
                Ok(())
            }
            None => Err(VaultError::UserNotFound),
        }
    }

    fn find_identity_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        Ok(self
            .identities
            .read()
            .unwrap()
            .values()
            .find(|i| {
                i.reset_token_hash.as_deref() == Some(token_hash)
                    && i.reset_token_expires.is_some_and(|exp| exp > now)
            })
            .cloned())
    }

    fn clear_reset_token(&self, email: &str) -> StoreResult<()> {
        let mut identities = self.identities.write().unwrap();
        match identities.get_mut(&normalize(email)) {
            Some(identity) => {
                identity.reset_token_hash = None;
                identity.reset_token_expires = None;
                Ok(())
            }
            None => Err(VaultError::UserNotFound),
        }
    }

    fn create_password_record(
        &self,
        new: PasswordChanges,
        owner: &str,
    ) -> StoreResult<PasswordRecord> {
        let now = Utc::now();
        let record = PasswordRecord {
            id: RecordId(Uuid::new_v4().to_string()),
            website: new.website,
            username: new.username,
            password_encrypted: new.password_encrypted,
            notes: new.notes,
            owner_email: normalize(owner),
            created_at: now,
            updated_at: now,
        };
        self.passwords
            .write()
            .unwrap()
            .insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn list_password_records(&self, owner: &str) -> StoreResult<Vec<PasswordRecord>> {
        let owner = normalize(owner);
        let mut records: Vec<PasswordRecord> = self
            .passwords
            .read()
            .unwrap()
            .values()
            .filter(|r| r.owner_email == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn count_password_records(&self, owner: &str) -> StoreResult<u64> {
        let owner = normalize(owner);
        Ok(self
            .passwords
            .read()
            .unwrap()
            .values()
            .filter(|r| r.owner_email == owner)
            .count() as u64)
    }

    fn update_password_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: PasswordChanges,
    ) -> StoreResult<Option<PasswordRecord>> {
        let owner = normalize(owner);
        let mut passwords = self.passwords.write().unwrap();
        match passwords.get_mut(&id.0) {
            Some(record) if record.owner_email == owner => {
                record.website = changes.website;
                record.username = changes.username;
                record.password_encrypted = changes.password_encrypted;
                record.notes = changes.notes;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            // Wrong owner is indistinguishable from a missing record
            _ => Ok(None),
        }
    }

    fn delete_password_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool> {
        let owner = normalize(owner);
        let mut passwords = self.passwords.write().unwrap();
        match passwords.get(&id.0) {
            Some(record) if record.owner_email == owner => {
                passwords.remove(&id.0);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn create_card_record(&self, new: CardChanges, owner: &str) -> StoreResult<CardRecord> {
        let now = Utc::now();
        let record = CardRecord {
            id: RecordId(Uuid::new_v4().to_string()),
            cardholder_name: new.cardholder_name,
            card_number_encrypted: new.card_number_encrypted,
            card_number_last4: new.card_number_last4,
            expiry_date: new.expiry_date,
            cvv_encrypted: new.cvv_encrypted,
            notes: new.notes,
            owner_email: normalize(owner),
            created_at: now,
            updated_at: now,
        };
        self.cards
            .write()
            .unwrap()
            .insert(record.id.0.clone(), record.clone());
        Ok(record)
    }

    fn list_card_records(&self, owner: &str) -> StoreResult<Vec<CardRecord>> {
        let owner = normalize(owner);
        let mut records: Vec<CardRecord> = self
            .cards
            .read()
            .unwrap()
            .values()
            .filter(|r| r.owner_email == owner)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn count_card_records(&self, owner: &str) -> StoreResult<u64> {
        let owner = normalize(owner);
        Ok(self
            .cards
            .read()
            .unwrap()
            .values()
            .filter(|r| r.owner_email == owner)
            .count() as u64)
    }

    fn update_card_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: CardChanges,
    ) -> StoreResult<Option<CardRecord>> {
        let owner = normalize(owner);
        let mut cards = self.cards.write().unwrap();
        match cards.get_mut(&id.0) {
            Some(record) if record.owner_email == owner => {
                record.cardholder_name = changes.cardholder_name;
                record.card_number_encrypted = changes.card_number_encrypted;
                record.card_number_last4 = changes.card_number_last4;
                record.expiry_date = changes.expiry_date;
                record.cvv_encrypted = changes.cvv_encrypted;
                record.notes = changes.notes;
                record.updated_at = Utc::now();
                Ok(Some(record.clone()))
            }
            _ => Ok(None),
        }
    }

    fn delete_card_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool> {
        let owner = normalize(owner);
        let mut cards = self.cards.write().unwrap();
        match cards.get(&id.0) {
            Some(record) if record.owner_email == owner => {
                cards.remove(&id.0);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// In-memory session store
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for InMemorySessionStore {
    fn create(&self, email: &str) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            email: normalize(email),
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .unwrap()
            .insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        Ok(self.sessions.read().unwrap().get(session_id).cloned())
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(session_id);
        Ok(())
    }
}
