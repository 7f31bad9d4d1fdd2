//! Federated identity provider client
//!
//! Exchanges an authorization code for a verified profile. Two providers
//! are supported; both end in the same shape: a verified email plus
//! optional name and avatar, fed into the identity upsert.

use serde::Deserialize;
use url::Url;

use crate::config::OAuthClientConfig;
use crate::error::VaultError;
use crate::store::Provider;

/// Which federated provider a flow talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProviderKind {
    Google,
    Github,
}

impl OAuthProviderKind {
    /// The identity provider tag recorded on upsert
    pub fn provider(self) -> Provider {
        match self {
            OAuthProviderKind::Google => Provider::Google,
            OAuthProviderKind::Github => Provider::Github,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OAuthProviderKind::Google => "Google",
            OAuthProviderKind::Github => "GitHub",
        }
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            OAuthProviderKind::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProviderKind::Github => "https://github.com/login/oauth/authorize",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            OAuthProviderKind::Google => "https://oauth2.googleapis.com/token",
            OAuthProviderKind::Github => "https://github.com/login/oauth/access_token",
        }
    }

    fn profile_endpoint(self) -> &'static str {
        match self {
            OAuthProviderKind::Google => "https://www.googleapis.com/oauth2/v3/userinfo",
            OAuthProviderKind::Github => "https://api.github.com/user",
        }
    }
}

/// Verified profile returned by a provider exchange
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

/// Build the provider authorization redirect URL
pub fn authorize_url(
    kind: OAuthProviderKind,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> Result<String, VaultError> {
    let mut url = Url::parse(kind.authorize_endpoint())
        .map_err(|e| VaultError::Internal(e.to_string()))?;

    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri);

        match kind {
            OAuthProviderKind::Google => {
                query
                    .append_pair("response_type", "code")
                    .append_pair("scope", "openid email profile")
                    .append_pair("access_type", "offline")
                    .append_pair("prompt", "consent")
                    .append_pair("include_granted_scopes", "true");
            }
            OAuthProviderKind::Github => {
                query.append_pair("scope", "user:email");
            }
        }

        query.append_pair("state", state);
    }

    Ok(url.into())
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
struct GoogleProfile {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Deserialize)]
struct GithubProfile {
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
}

fn upstream(kind: OAuthProviderKind, e: reqwest::Error) -> VaultError {
    tracing::error!(provider = kind.name(), error = %e, "Provider request failed");
    VaultError::Internal(format!("{} request failed", kind.name()))
}

/// Exchange an authorization code for a verified profile
///
/// No timeout is enforced on the outbound calls; the request blocks until
/// the provider answers or the connection drops.
pub async fn exchange_code(
    http: &reqwest::Client,
    kind: OAuthProviderKind,
    config: &OAuthClientConfig,
    code: &str,
    redirect_uri: &str,
) -> Result<OAuthProfile, VaultError> {
    let mut token_body = serde_json::json!({
        "client_id": config.client_id,
        "client_secret": config.client_secret,
        "code": code,
    });
    if kind == OAuthProviderKind::Google {
        token_body["grant_type"] = "authorization_code".into();
        token_body["redirect_uri"] = redirect_uri.into();
    }

    let token: TokenResponse = http
        .post(kind.token_endpoint())
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&token_body)
        .send()
        .await
        .map_err(|e| upstream(kind, e))?
        .json()
        .await
        .map_err(|e| upstream(kind, e))?;

    let access_token = token
        .access_token
        .ok_or_else(|| VaultError::OAuthExchange(format!("{} token exchange failed", kind.name())))?;

    match kind {
        OAuthProviderKind::Google => {
            let profile: GoogleProfile = http
                .get(kind.profile_endpoint())
                .bearer_auth(&access_token)
                .send()
                .await
                .map_err(|e| upstream(kind, e))?
                .json()
                .await
                .map_err(|e| upstream(kind, e))?;

            let email = profile
                .email
                .ok_or_else(|| VaultError::OAuthExchange("Google email not found".to_string()))?;

            Ok(OAuthProfile {
                email,
                name: profile.name,
                image: profile.picture,
            })
        }
        OAuthProviderKind::Github => {
            let profile: GithubProfile = http
                .get(kind.profile_endpoint())
                .bearer_auth(&access_token)
                .header(reqwest::header::USER_AGENT, "nopass-server")
                .send()
                .await
                .map_err(|e| upstream(kind, e))?
                .json()
                .await
                .map_err(|e| upstream(kind, e))?;

            // The profile hides the email for most accounts; fall back to
            // the primary entry of the emails listing
            let email = match profile.email {
                Some(email) => email,
                None => {
                    let emails: Vec<GithubEmail> = http
                        .get("https://api.github.com/user/emails")
                        .bearer_auth(&access_token)
                        .header(reqwest::header::USER_AGENT, "nopass-server")
                        .send()
                        .await
                        .map_err(|e| upstream(kind, e))?
                        .json()
                        .await
                        .map_err(|e| upstream(kind, e))?;

                    emails
                        .into_iter()
                        .find(|e| e.primary)
                        .map(|e| e.email)
                        .ok_or_else(|| {
                            VaultError::OAuthExchange("GitHub email not found".to_string())
                        })?
                }
            };

            Ok(OAuthProfile {
                email,
                name: profile.name,
                image: profile.avatar_url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_authorize_url() {
        let url = authorize_url(
            OAuthProviderKind::Google,
            "client-1",
            "https://vault.example.com/api/auth/google/callback",
            "/dashboard",
        )
        .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("accounts.google.com"));
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("client_id".into(), "client-1".into())));
        assert!(pairs.contains(&("response_type".into(), "code".into())));
        assert!(pairs.contains(&("scope".into(), "openid email profile".into())));
        assert!(pairs.contains(&("state".into(), "/dashboard".into())));
    }

    #[test]
    fn test_github_authorize_url() {
        let url = authorize_url(
            OAuthProviderKind::Github,
            "client-2",
            "nopassmobile://redirect",
            "nopassmobile://redirect",
        )
        .unwrap();

        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("github.com"));
        assert!(url.contains("scope=user%3Aemail"));
    }
}
