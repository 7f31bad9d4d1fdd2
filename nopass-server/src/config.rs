//! Server configuration
//!
//! All environment values are read once at startup and injected into the
//! application state; handlers never read the environment ad hoc.

use anyhow::{bail, Context};

/// Client id/secret pair for one OAuth application
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthClientConfig {
    fn from_env(id_var: &str, secret_var: &str) -> Option<Self> {
        let client_id = get_env(id_var)?;
        let client_secret = get_env(secret_var)?;
        Some(Self { client_id, client_secret })
    }
}

#[derive(Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Public base URL, used for reset links, OAuth callbacks and
    /// redirect-target validation
    pub base_url: String,

    /// 256-bit field-encryption key
    pub encryption_key: [u8; 32],

    /// Secret for bearer-token signing and session-cookie keys
    pub token_secret: String,

    /// Exact web origins allowed through the origin gate
    pub allowed_origins: Vec<String>,

    /// URI scheme prefixes identifying the mobile client
    pub allowed_mobile_schemes: Vec<String>,

    /// When false the origin gate fails open (development mode)
    pub strict_origin_check: bool,

    /// Add Strict-Transport-Security to responses (production + TLS)
    pub hsts: bool,

    /// Default deep-link target for mobile OAuth completions
    pub mobile_redirect_scheme: String,

    pub google: Option<OAuthClientConfig>,
    pub github: Option<OAuthClientConfig>,
    pub google_mobile: Option<OAuthClientConfig>,
    pub github_mobile: Option<OAuthClientConfig>,

    /// SQLite database path; in-memory stores when unset
    pub database_path: Option<String>,
}

/// Helper to get a non-empty env var
fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn get_bool(key: &str) -> bool {
    matches!(
        std::env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Required: `ENCRYPTION_KEY` (64 hex chars), `TOKEN_SECRET`.
    pub fn from_env() -> anyhow::Result<Self> {
        let key_hex = get_env("ENCRYPTION_KEY").context("ENCRYPTION_KEY is required")?;
        let key_bytes = hex::decode(key_hex.trim()).context("ENCRYPTION_KEY must be hex")?;
        let encryption_key: [u8; 32] = match key_bytes.try_into() {
            Ok(k) => k,
            Err(_) => bail!("ENCRYPTION_KEY must decode to 32 bytes"),
        };

        let token_secret = get_env("TOKEN_SECRET").context("TOKEN_SECRET is required")?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let base_url = get_env("BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let allowed_origins = get_env("ALLOWED_ORIGINS")
            .map(|v| split_list(&v))
            .unwrap_or_default();

        let allowed_mobile_schemes = get_env("ALLOWED_MOBILE_SCHEMES")
            .map(|v| split_list(&v))
            .unwrap_or_else(|| vec!["exp://".to_string(), "nopassmobile://".to_string()]);

        let mobile_redirect_scheme = get_env("MOBILE_REDIRECT_SCHEME")
            .unwrap_or_else(|| "nopassmobile://redirect".to_string());

        Ok(Self {
            port,
            base_url,
            encryption_key,
            token_secret,
            allowed_origins,
            allowed_mobile_schemes,
            strict_origin_check: get_bool("STRICT_ORIGIN_CHECK"),
            hsts: get_bool("HSTS"),
            mobile_redirect_scheme,
            google: OAuthClientConfig::from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: OAuthClientConfig::from_env("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            google_mobile: OAuthClientConfig::from_env(
                "GOOGLE_MOBILE_CLIENT_ID",
                "GOOGLE_MOBILE_CLIENT_SECRET",
            ),
            github_mobile: OAuthClientConfig::from_env(
                "GITHUB_MOBILE_CLIENT_ID",
                "GITHUB_MOBILE_CLIENT_SECRET",
            ),
            database_path: get_env("DATABASE_PATH"),
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Key material and secrets are omitted
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("allowed_origins", &self.allowed_origins)
            .field("allowed_mobile_schemes", &self.allowed_mobile_schemes)
            .field("strict_origin_check", &self.strict_origin_check)
            .field("hsts", &self.hsts)
            .field("mobile_redirect_scheme", &self.mobile_redirect_scheme)
            .field("google", &self.google.is_some())
            .field("github", &self.github.is_some())
            .field("google_mobile", &self.google_mobile.is_some())
            .field("github_mobile", &self.github_mobile.is_some())
            .field("database_path", &self.database_path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list("https://a.com, https://b.com,,"),
            vec!["https://a.com".to_string(), "https://b.com".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
