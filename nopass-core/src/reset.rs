//! Single-use password-reset tokens
//!
//! The raw token travels in the reset link; only its SHA-256 digest is
//! persisted on the identity, alongside an absolute expiry.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Reset tokens expire one hour after issue
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// A freshly generated reset token
pub struct ResetToken {
    /// The raw value to embed in the reset link (never stored)
    pub raw: String,
    /// SHA-256 hex digest of the raw value, for persistence
    pub hash: String,
}

impl ResetToken {
    /// Generate a 32-byte random token
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let raw = hex::encode(bytes);
        let hash = hash_token(&raw);
        Self { raw, hash }
    }
}

/// Hash a raw reset token for lookup against the stored digest
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
