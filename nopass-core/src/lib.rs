//! NoPass Core Library
//!
//! Cryptographic primitives for the NoPass vault:
//! - Field-level authenticated encryption for stored secrets
//! - One-way credential hashing for local accounts
//! - Signed bearer tokens for the mobile client
//! - Single-use password-reset tokens

pub mod cipher;
pub mod credentials;
pub mod error;
pub mod reset;
pub mod token;

pub use cipher::FieldCipher;
pub use credentials::{hash_password, verify_password};
pub use error::Error;
pub use reset::ResetToken;
pub use token::{TokenClaims, TokenService};

/// Result type for nopass-core operations
pub type Result<T> = std::result::Result<T, Error>;
