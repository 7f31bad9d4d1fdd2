//! Field-level authenticated encryption
//!
//! Secrets are encrypted with AES-256-GCM using a fresh random 96-bit nonce
//! per call. The stored form is a three-segment envelope,
//! `hex(nonce):hex(ciphertext):hex(tag)`, which is a wire format: existing
//! records and every client must match it exactly.

use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};

use crate::{Error, Result};

/// Nonce length in bytes (96 bits)
const NONCE_LEN: usize = 12;
/// GCM authentication tag length in bytes
const TAG_LEN: usize = 16;
/// Segment separator in the envelope format
const SEPARATOR: char = ':';

/// Encrypts and decrypts single text fields with a process-lifetime key.
///
/// The key is injected once at startup; there is no key versioning, so
/// changing the key invalidates all previously encrypted envelopes.
#[derive(Clone)]
pub struct FieldCipher {
    key: [u8; 32],
}

impl FieldCipher {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Build a cipher from a 64-character hex key string
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim())?;
        let key: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKey("encryption key must be 32 bytes".into()))?;
        Ok(Self::new(key))
    }

    fn sealing_key(&self) -> Result<LessSafeKey> {
        let unbound = UnboundKey::new(&AES_256_GCM, &self.key)
            .map_err(|_| Error::InvalidKey("failed to create AES-256-GCM key".into()))?;
        Ok(LessSafeKey::new(unbound))
    }

    /// Encrypt a plaintext field into the envelope format
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.sealing_key()?;

        let rng = SystemRandom::new();
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill(&mut nonce_bytes).map_err(|_| Error::EncryptionFailed)?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        // Seal in place: the buffer is extended with the authentication tag
        let mut in_out = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| Error::EncryptionFailed)?;

        let tag_start = in_out.len() - TAG_LEN;
        Ok(format!(
            "{}{sep}{}{sep}{}",
            hex::encode(nonce_bytes),
            hex::encode(&in_out[..tag_start]),
            hex::encode(&in_out[tag_start..]),
            sep = SEPARATOR,
        ))
    }

    /// Decrypt an envelope back to the plaintext field
    ///
    /// Fails hard on a malformed envelope or a tag that does not verify;
    /// never returns partial or corrupted plaintext.
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        let parts: Vec<&str> = envelope.split(SEPARATOR).collect();
        if parts.len() != 3 {
            return Err(Error::MalformedEnvelope("expected 3 segments".into()));
        }

        let nonce_bytes = hex::decode(parts[0])?;
        let ciphertext = hex::decode(parts[1])?;
        let tag = hex::decode(parts[2])?;

        let nonce_bytes: [u8; NONCE_LEN] = nonce_bytes
            .try_into()
            .map_err(|_| Error::MalformedEnvelope("nonce must be 12 bytes".into()))?;
        if tag.len() != TAG_LEN {
            return Err(Error::MalformedEnvelope("tag must be 16 bytes".into()));
        }

        let key = self.sealing_key()?;
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut in_out = ciphertext;
        in_out.extend_from_slice(&tag);
        let plaintext = key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| Error::DecryptionFailed)?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| Error::DecryptionFailed)
    }
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose key material
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}
