//! Common test utilities for server integration tests

use std::sync::{Arc, RwLock};

use axum_test::TestServer;
use serde_json::json;

use nopass_server::{
    routes, AppState, Config, InMemorySessionStore, InMemoryVaultStore, MailSender,
};

/// Mock mail sender that captures reset links
#[derive(Default, Clone)]
pub struct MockMailSender {
    /// Captured (email, link) pairs
    pub sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockMailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Get the last reset link sent to an email
    pub fn get_link(&self, email: &str) -> Option<String> {
        self.sent
            .read()
            .unwrap()
            .iter()
            .rev()
            .find(|(e, _)| e == email)
            .map(|(_, link)| link.clone())
    }

    /// Extract the raw token from the last reset link sent to an email
    pub fn get_reset_token(&self, email: &str) -> Option<String> {
        self.get_link(email)
            .and_then(|link| link.split("token=").nth(1).map(str::to_string))
    }

    pub fn sent_count(&self) -> usize {
        self.sent.read().unwrap().len()
    }
}

impl MailSender for MockMailSender {
    fn send_reset(&self, email: &str, reset_link: &str) -> Result<(), String> {
        self.sent
            .write()
            .unwrap()
            .push((email.to_string(), reset_link.to_string()));
        Ok(())
    }
}

pub type TestState = Arc<AppState<InMemoryVaultStore, InMemorySessionStore, MockMailSender>>;

pub struct TestContext {
    pub server: TestServer,
    pub mail: MockMailSender,
    pub state: TestState,
}

/// Base configuration used by the tests: strict origin checking with one
/// allowed web origin and the default mobile schemes
pub fn test_config() -> Config {
    Config {
        port: 0,
        base_url: "https://vault.example.com".to_string(),
        encryption_key: [7u8; 32],
        token_secret: "integration-test-secret".to_string(),
        allowed_origins: vec!["https://app.example.com".to_string()],
        allowed_mobile_schemes: vec!["exp://".to_string(), "nopassmobile://".to_string()],
        strict_origin_check: true,
        hsts: false,
        mobile_redirect_scheme: "nopassmobile://redirect".to_string(),
        google: None,
        github: None,
        google_mobile: None,
        github_mobile: None,
        database_path: None,
    }
}

/// Create a test server with in-memory stores and a mock mail sender
pub fn create_test_server() -> TestContext {
    create_test_server_with(test_config())
}

/// Create a test server with a custom configuration
pub fn create_test_server_with(config: Config) -> TestContext {
    let mail = MockMailSender::new();

    let state = Arc::new(AppState::new(
        config,
        InMemoryVaultStore::new(),
        InMemorySessionStore::new(),
        mail.clone(),
    ));

    let app = routes::create_router(state.clone());
    let server = TestServer::new(app).expect("Failed to create test server");

    TestContext { server, mail, state }
}

/// Helper to register a local account
pub async fn register_user(server: &TestServer, email: &str, password: &str) {
    let response = server
        .post("/api/register")
        .json(&json!({
            "name": "Test User",
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 201);
}

/// Helper to sign in and return the session cookie value
pub async fn sign_in(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/auth/sign-in")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    response
        .maybe_cookie("nopass_session")
        .expect("No session cookie")
        .value()
        .to_string()
}

/// Helper to register + sign in, returning the session cookie value
pub async fn create_session(server: &TestServer, email: &str, password: &str) -> String {
    register_user(server, email, password).await;
    sign_in(server, email, password).await
}

/// Build the session cookie for a request
pub fn session_cookie(value: &str) -> cookie::Cookie<'static> {
    cookie::Cookie::new("nopass_session", value.to_string())
}

/// Helper for mobile login, returning the bearer token
pub async fn mobile_login(server: &TestServer, email: &str, password: &str) -> String {
    let response = server
        .post("/api/mobile-login")
        .json(&json!({
            "email": email,
            "password": password,
        }))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    body["token"].as_str().expect("No token in response").to_string()
}
