//! Application state

use sha2::{Digest, Sha256};
use tower_cookies::Key;

use nopass_core::{FieldCipher, TokenService};

use crate::config::Config;
use crate::email::MailSender;
use crate::store::{SessionStore, VaultStore};

/// Shared per-process state, constructed once at startup
pub struct AppState<S, N, M> {
    pub store: S,
    pub session_store: N,
    pub mail_sender: M,
    /// Field cipher holding the process-lifetime encryption key
    pub cipher: FieldCipher,
    /// Bearer-token issuer/verifier
    pub tokens: TokenService,
    /// Key for signing session cookies, derived from the token secret
    pub cookie_key: Key,
    pub config: Config,
    /// Reused client for federated-provider exchanges
    pub http: reqwest::Client,
}

impl<S, N, M> AppState<S, N, M>
where
    S: VaultStore,
    N: SessionStore,
    M: MailSender,
{
    pub fn new(config: Config, store: S, session_store: N, mail_sender: M) -> Self {
        let cipher = FieldCipher::new(config.encryption_key);
        let tokens = TokenService::new(&config.token_secret);
        let cookie_key = derive_cookie_key(&config.token_secret);

        Self {
            store,
            session_store,
            mail_sender,
            cipher,
            tokens,
            cookie_key,
            config,
            http: reqwest::Client::new(),
        }
    }
}

/// Stretch the token secret into the 64 bytes of cookie-key material
fn derive_cookie_key(secret: &str) -> Key {
    let first = Sha256::digest(secret.as_bytes());
    let second = Sha256::digest(first);

    let mut material = [0u8; 64];
    material[..32].copy_from_slice(&first);
    material[32..].copy_from_slice(&second);
    Key::from(&material)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_key_is_deterministic() {
        let a = derive_cookie_key("secret");
        let b = derive_cookie_key("secret");
        assert_eq!(a.master(), b.master());

        let c = derive_cookie_key("other");
        assert_ne!(a.master(), c.master());
    }
}
