//! Signed bearer tokens for non-browser clients
//!
//! Tokens are HS256 JWTs carrying the identity reference and email. They
//! are never persisted; validity is recomputed on every use from the
//! signature and the expiry claim.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Claims embedded in a bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Identity reference (stable id of the user)
    pub sub: String,
    /// Identity email at issue time
    pub email: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a server-held secret
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Sign a token for the given identity with the given time-to-live
    pub fn issue(&self, identity_id: &str, email: &str, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: identity_id.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| Error::TokenEncoding(e.to_string()))
    }

    /// Verify a token and return its claims
    ///
    /// Distinguishes [`Error::TokenExpired`] (signature valid, clock past
    /// expiry) from [`Error::InvalidToken`] (signature or format failure);
    /// callers report the two differently.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<TokenClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(Error::TokenExpired),
                _ => Err(Error::InvalidToken),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new("test-secret");
        let token = service
            .issue("user-1", "alice@example.com", Duration::days(7))
            .unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_classified_as_expired() {
        let service = TokenService::new("test-secret");
        // Past the default validation leeway
        let token = service
            .issue("user-1", "alice@example.com", Duration::hours(-2))
            .unwrap();

        assert!(matches!(service.verify(&token), Err(Error::TokenExpired)));
    }

    #[test]
    fn test_garbage_token_classified_as_invalid() {
        let service = TokenService::new("test-secret");
        assert!(matches!(
            service.verify("not.a.token"),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn test_wrong_secret_classified_as_invalid() {
        let token = TokenService::new("secret-a")
            .issue("user-1", "alice@example.com", Duration::days(1))
            .unwrap();

        assert!(matches!(
            TokenService::new("secret-b").verify(&token),
            Err(Error::InvalidToken)
        ));
    }
}
