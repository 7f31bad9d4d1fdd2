//! SQLite-based storage implementation

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{
    CardChanges, CardRecord, Identity, NewIdentity, PasswordChanges, PasswordRecord, Provider,
    RecordId, Session, SessionId, SessionStore, StoreResult, VaultStore,
};
use crate::error::VaultError;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

fn internal<E: std::fmt::Display>(e: E) -> VaultError {
    VaultError::Internal(e.to_string())
}

fn parse_dt(s: String) -> Result<DateTime<Utc>, VaultError> {
    DateTime::parse_from_rfc3339(&s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(internal)
}

fn parse_dt_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, VaultError> {
    s.map(parse_dt).transpose()
}

/// SQLite store implementing both [`VaultStore`] and [`SessionStore`]
///
/// Holds one process-wide connection behind a mutex; `Clone` shares the
/// same handle so the database is opened exactly once.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path
    pub fn open(path: &str) -> Result<Self, VaultError> {
        let conn = Connection::open(path).map_err(internal)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;").map_err(internal)?;

        Self::migrate(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run database migrations
    fn migrate(conn: &Connection) -> Result<(), VaultError> {
        let current_version = Self::get_schema_version(conn)?;

        if current_version < SCHEMA_VERSION {
            tracing::info!(
                current = current_version,
                target = SCHEMA_VERSION,
                "Running database migrations"
            );

            if current_version < 1 {
                Self::migrate_v1(conn)?;
            }

            conn.execute(
                "INSERT OR REPLACE INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(internal)?;

            tracing::info!("Database migrations complete");
        }

        Ok(())
    }

    /// Get current schema version (0 if no schema exists)
    fn get_schema_version(conn: &Connection) -> Result<i32, VaultError> {
        let table_exists: bool = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
                [],
                |row| row.get(0),
            )
            .map_err(internal)?;

        if !table_exists {
            return Ok(0);
        }

        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get::<_, Option<i32>>(0).map(|v| v.unwrap_or(0))
        })
        .map_err(internal)
    }

    /// Migration to version 1: initial schema
    fn migrate_v1(conn: &Connection) -> Result<(), VaultError> {
        conn.execute_batch(
            r#"
            -- Schema version tracking
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            -- Identities
            CREATE TABLE IF NOT EXISTS identities (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                name TEXT,
                password_hash TEXT,
                provider TEXT NOT NULL,
                image TEXT,
                created_at TEXT NOT NULL,
                last_login TEXT,
                reset_token_hash TEXT,
                reset_token_expires TEXT
            );

            -- Password records
            CREATE TABLE IF NOT EXISTS password_records (
                id TEXT PRIMARY KEY,
                website TEXT NOT NULL,
                username TEXT NOT NULL,
                password_encrypted TEXT NOT NULL,
                notes TEXT,
                owner_email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_password_records_owner ON password_records(owner_email);

            -- Card records
            CREATE TABLE IF NOT EXISTS card_records (
                id TEXT PRIMARY KEY,
                cardholder_name TEXT NOT NULL,
                card_number_encrypted TEXT NOT NULL,
                card_number_last4 TEXT NOT NULL,
                expiry_date TEXT NOT NULL,
                cvv_encrypted TEXT NOT NULL,
                notes TEXT,
                owner_email TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_card_records_owner ON card_records(owner_email);

            -- Sessions
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(internal)
    }

    fn identity_from_row(row: &Row<'_>) -> rusqlite::Result<(Identity, Option<String>, Option<String>, String)> {
        // Raw datetime strings are parsed outside the rusqlite closure so
        // parse failures surface as VaultError, not rusqlite errors
        let identity = Identity {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            provider: Provider::from_str(&row.get::<_, String>(4)?)
                .unwrap_or(Provider::Credentials),
            image: row.get(5)?,
            created_at: Utc::now(), // replaced by caller
            last_login: None,
            reset_token_hash: row.get(8)?,
            reset_token_expires: None,
        };
        let last_login: Option<String> = row.get(7)?;
        let reset_expires: Option<String> = row.get(9)?;
        let created_at: String = row.get(6)?;
        Ok((identity, last_login, reset_expires, created_at))
    }

    fn query_identity(
        &self,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> StoreResult<Option<Identity>> {
        let conn = self.conn.lock().unwrap();
        let sql = format!(
            "SELECT id, email, name, password_hash, provider, image, created_at, last_login, \
             reset_token_hash, reset_token_expires FROM identities WHERE {where_clause}"
        );
        let raw = conn
            .query_row(&sql, params, Self::identity_from_row)
            .optional()
            .map_err(internal)?;

        match raw {
            None => Ok(None),
            Some((mut identity, last_login, reset_expires, created_at)) => {
                identity.created_at = parse_dt(created_at)?;
                identity.last_login = parse_dt_opt(last_login)?;
                identity.reset_token_expires = parse_dt_opt(reset_expires)?;
                Ok(Some(identity))
            }
        }
    }

    fn password_from_row(row: &Row<'_>) -> rusqlite::Result<(PasswordRecord, String, String)> {
        let record = PasswordRecord {
            id: RecordId(row.get(0)?),
            website: row.get(1)?,
            username: row.get(2)?,
            password_encrypted: row.get(3)?,
            notes: row.get(4)?,
            owner_email: row.get(5)?,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        Ok((record, row.get(6)?, row.get(7)?))
    }

    fn card_from_row(row: &Row<'_>) -> rusqlite::Result<(CardRecord, String, String)> {
        let record = CardRecord {
            id: RecordId(row.get(0)?),
            cardholder_name: row.get(1)?,
            card_number_encrypted: row.get(2)?,
            card_number_last4: row.get(3)?,
            expiry_date: row.get(4)?,
            cvv_encrypted: row.get(5)?,
            notes: row.get(6)?,
            owner_email: row.get(7)?,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        Ok((record, row.get(8)?, row.get(9)?))
    }
}

impl VaultStore for SqliteStore {
    fn create_identity(&self, new: NewIdentity) -> StoreResult<Identity> {
        let email = normalize(&new.email);
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

        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO identities (id, email, name, password_hash, provider, image, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                identity.id,
                identity.email,
                identity.name,
                identity.password_hash,
                identity.provider.as_str(),
                identity.image,
                identity.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(identity),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(VaultError::UserAlreadyExists)
            }
            Err(e) => Err(internal(e)),
        }
    }

    fn get_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        self.query_identity("email = ?1", &[&normalize(email)])
    }

    fn get_identity_by_id(&self, id: &str) -> StoreResult<Option<Identity>> {
        self.query_identity("id = ?1", &[&id])
    }

    fn touch_last_login(&self, email: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE identities SET last_login = ?1 WHERE email = ?2",
                params![Utc::now().to_rfc3339(), normalize(email)],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(VaultError::UserNotFound);
        }
        Ok(())
    }

    fn set_password_hash(&self, email: &str, password_hash: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE identities SET password_hash = ?1 WHERE email = ?2",
                params![password_hash, normalize(email)],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(VaultError::UserNotFound);
        }
        Ok(())
    }

    fn upsert_federated_identity(
        &self,
        email: &str,
        name: Option<&str>,
        image: Option<&str>,
        provider: Provider,
    ) -> StoreResult<Identity> {
        if self.get_identity_by_email(email)?.is_some() {
            self.touch_last_login(email)?;
            return Ok(self
                .get_identity_by_email(email)?
                .ok_or_else(|| internal("identity vanished during upsert"))?);
        }

        let identity = self.create_identity(NewIdentity {
            email: email.to_string(),
            name: name.map(str::to_string),
            password_hash: None,
            provider,
            image: image.map(str::to_string),
        })?;
        self.touch_last_login(&identity.email)?;

        Ok(self
            .get_identity_by_email(&identity.email)?
            .ok_or_else(|| internal("identity vanished during upsert"))?)
    }

    fn set_reset_token(
        &self,
        email: &str,
        token_hash: &str,
        expires: DateTime<Utc>,
    ) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE identities SET reset_token_hash = ?1, reset_token_expires = ?2 \
                 WHERE email = ?3",
                params![token_hash, expires.to_rfc3339(), normalize(email)],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(VaultError::UserNotFound);
        }
        Ok(())
    }

    fn find_identity_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Identity>> {
        self.query_identity(
            "reset_token_hash = ?1 AND reset_token_expires > ?2",
            &[&token_hash, &now.to_rfc3339()],
        )
    }

    fn clear_reset_token(&self, email: &str) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn
            .execute(
                "UPDATE identities SET reset_token_hash = NULL, reset_token_expires = NULL \
                 WHERE email = ?1",
                params![normalize(email)],
            )
            .map_err(internal)?;
        if changed == 0 {
            return Err(VaultError::UserNotFound);
        }
        Ok(())
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

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO password_records \
             (id, website, username, password_encrypted, notes, owner_email, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id.0,
                record.website,
                record.username,
                record.password_encrypted,
                record.notes,
                record.owner_email,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(record)
    }

    fn list_password_records(&self, owner: &str) -> StoreResult<Vec<PasswordRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, website, username, password_encrypted, notes, owner_email, \
                 created_at, updated_at FROM password_records \
                 WHERE owner_email = ?1 ORDER BY created_at DESC",
            )
            .map_err(internal)?;

        let rows = stmt
            .query_map(params![normalize(owner)], Self::password_from_row)
            .map_err(internal)?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, created_at, updated_at) = row.map_err(internal)?;
            record.created_at = parse_dt(created_at)?;
            record.updated_at = parse_dt(updated_at)?;
            records.push(record);
        }
        Ok(records)
    }

    fn count_password_records(&self, owner: &str) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM password_records WHERE owner_email = ?1",
            params![normalize(owner)],
            |row| row.get::<_, u64>(0),
        )
        .map_err(internal)
    }

    fn update_password_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: PasswordChanges,
    ) -> StoreResult<Option<PasswordRecord>> {
        let changed = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE password_records SET website = ?1, username = ?2, \
                 password_encrypted = ?3, notes = ?4, updated_at = ?5 \
                 WHERE id = ?6 AND owner_email = ?7",
                params![
                    changes.website,
                    changes.username,
                    changes.password_encrypted,
                    changes.notes,
                    Utc::now().to_rfc3339(),
                    id.0,
                    normalize(owner),
                ],
            )
            .map_err(internal)?
        };

        if changed == 0 {
            return Ok(None);
        }
        Ok(self
            .list_password_records(owner)?
            .into_iter()
            .find(|r| r.id == *id))
    }

    fn delete_password_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute(
                "DELETE FROM password_records WHERE id = ?1 AND owner_email = ?2",
                params![id.0, normalize(owner)],
            )
            .map_err(internal)?;
        Ok(deleted > 0)
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

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO card_records \
             (id, cardholder_name, card_number_encrypted, card_number_last4, expiry_date, \
              cvv_encrypted, notes, owner_email, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id.0,
                record.cardholder_name,
                record.card_number_encrypted,
                record.card_number_last4,
                record.expiry_date,
                record.cvv_encrypted,
                record.notes,
                record.owner_email,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )
        .map_err(internal)?;

        Ok(record)
    }

    fn list_card_records(&self, owner: &str) -> StoreResult<Vec<CardRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, cardholder_name, card_number_encrypted, card_number_last4, \
                 expiry_date, cvv_encrypted, notes, owner_email, created_at, updated_at \
                 FROM card_records WHERE owner_email = ?1 ORDER BY created_at DESC",
            )
            .map_err(internal)?;

        let rows = stmt
            .query_map(params![normalize(owner)], Self::card_from_row)
            .map_err(internal)?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, created_at, updated_at) = row.map_err(internal)?;
            record.created_at = parse_dt(created_at)?;
            record.updated_at = parse_dt(updated_at)?;
            records.push(record);
        }
        Ok(records)
    }

    fn count_card_records(&self, owner: &str) -> StoreResult<u64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM card_records WHERE owner_email = ?1",
            params![normalize(owner)],
            |row| row.get::<_, u64>(0),
        )
        .map_err(internal)
    }

    fn update_card_record(
        &self,
        id: &RecordId,
        owner: &str,
        changes: CardChanges,
    ) -> StoreResult<Option<CardRecord>> {
        let changed = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "UPDATE card_records SET cardholder_name = ?1, card_number_encrypted = ?2, \
                 card_number_last4 = ?3, expiry_date = ?4, cvv_encrypted = ?5, notes = ?6, \
                 updated_at = ?7 WHERE id = ?8 AND owner_email = ?9",
                params![
                    changes.cardholder_name,
                    changes.card_number_encrypted,
                    changes.card_number_last4,
                    changes.expiry_date,
                    changes.cvv_encrypted,
                    changes.notes,
                    Utc::now().to_rfc3339(),
                    id.0,
                    normalize(owner),
                ],
            )
            .map_err(internal)?
        };

        if changed == 0 {
            return Ok(None);
        }
        Ok(self
            .list_card_records(owner)?
            .into_iter()
            .find(|r| r.id == *id))
    }

    fn delete_card_record(&self, id: &RecordId, owner: &str) -> StoreResult<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn
            .execute(
                "DELETE FROM card_records WHERE id = ?1 AND owner_email = ?2",
                params![id.0, normalize(owner)],
            )
            .map_err(internal)?;
        Ok(deleted > 0)
    }
}

impl SessionStore for SqliteStore {
    fn create(&self, email: &str) -> StoreResult<Session> {
        let session = Session {
            id: SessionId(Uuid::new_v4().to_string()),
            email: normalize(email),
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, email, created_at) VALUES (?1, ?2, ?3)",
            params![session.id.0, session.email, session.created_at.to_rfc3339()],
        )
        .map_err(internal)?;

        Ok(session)
    }

    fn get(&self, session_id: &SessionId) -> StoreResult<Option<Session>> {
        let conn = self.conn.lock().unwrap();
        let raw = conn
            .query_row(
                "SELECT id, email, created_at FROM sessions WHERE id = ?1",
                params![session_id.0],
                |row| {
                    Ok((
                        SessionId(row.get::<_, String>(0)?),
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(internal)?;

        match raw {
            None => Ok(None),
            Some((id, email, created_at)) => Ok(Some(Session {
                id,
                email,
                created_at: parse_dt(created_at)?,
            })),
        }
    }

    fn delete(&self, session_id: &SessionId) -> StoreResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM sessions WHERE id = ?1", params![session_id.0])
            .map_err(internal)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp_store() -> (SqliteStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_migration_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");
        let path = path.to_str().unwrap();

        drop(SqliteStore::open(path).unwrap());
        // Re-opening runs migrations against the existing schema
        drop(SqliteStore::open(path).unwrap());
    }

    #[test]
    fn test_identity_roundtrip() {
        let (store, _dir) = open_temp_store();

        store
            .create_identity(NewIdentity {
                email: "A@X.com".to_string(),
                name: Some("Alice".to_string()),
                password_hash: Some("hash".to_string()),
                provider: Provider::Credentials,
                image: None,
            })
            .unwrap();

        let identity = store.get_identity_by_email("a@x.com").unwrap().unwrap();
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.name.as_deref(), Some("Alice"));
        assert!(identity.last_login.is_none());

        let by_id = store.get_identity_by_id(&identity.id).unwrap().unwrap();
        assert_eq!(by_id.email, identity.email);

        let err = store
            .create_identity(NewIdentity {
                email: "a@x.com".to_string(),
                name: None,
                password_hash: None,
                provider: Provider::Google,
                image: None,
            })
            .unwrap_err();
        assert!(matches!(err, VaultError::UserAlreadyExists));
    }

    #[test]
    fn test_federated_upsert_is_idempotent() {
        let (store, _dir) = open_temp_store();

        let first = store
            .upsert_federated_identity("b@x.com", Some("Bob"), None, Provider::Github)
            .unwrap();
        let second = store
            .upsert_federated_identity("b@x.com", Some("Other"), None, Provider::Github)
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name.as_deref(), Some("Bob"));
        assert!(second.last_login.is_some());
    }

    #[test]
    fn test_record_ownership_filter() {
        let (store, _dir) = open_temp_store();

        let record = store
            .create_password_record(
                PasswordChanges {
                    website: "example.com".to_string(),
                    username: "alice".to_string(),
                    password_encrypted: "aa:bb:cc".to_string(),
                    notes: Some("note".to_string()),
                },
                "a@x.com",
            )
            .unwrap();

        assert_eq!(store.count_password_records("a@x.com").unwrap(), 1);
        assert_eq!(store.count_password_records("b@x.com").unwrap(), 0);
        assert!(!store.delete_password_record(&record.id, "b@x.com").unwrap());
        assert!(store.delete_password_record(&record.id, "a@x.com").unwrap());
    }

    #[test]
    fn test_card_roundtrip() {
        let (store, _dir) = open_temp_store();

        let record = store
            .create_card_record(
                CardChanges {
                    cardholder_name: "Alice".to_string(),
                    card_number_encrypted: "aa:bb:cc".to_string(),
                    card_number_last4: "1111".to_string(),
                    expiry_date: "12/27".to_string(),
                    cvv_encrypted: "dd:ee:ff".to_string(),
                    notes: None,
                },
                "a@x.com",
            )
            .unwrap();

        let listed = store.list_card_records("a@x.com").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].card_number_last4, "1111");

        let updated = store
            .update_card_record(
                &record.id,
                "a@x.com",
                CardChanges {
                    cardholder_name: "Alice B".to_string(),
                    card_number_encrypted: "11:22:33".to_string(),
                    card_number_last4: "2222".to_string(),
                    expiry_date: "01/30".to_string(),
                    cvv_encrypted: "44:55:66".to_string(),
                    notes: None,
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.cardholder_name, "Alice B");
        assert_eq!(updated.card_number_last4, "2222");
    }

    #[test]
    fn test_session_lifecycle() {
        let (store, _dir) = open_temp_store();

        let session = SessionStore::create(&store, "a@x.com").unwrap();
        assert!(SessionStore::get(&store, &session.id).unwrap().is_some());
        SessionStore::delete(&store, &session.id).unwrap();
        assert!(SessionStore::get(&store, &session.id).unwrap().is_none());
    }
}
