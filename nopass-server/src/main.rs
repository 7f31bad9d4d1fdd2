//! NoPass Vault Server
//!
//! Personal-vault web service: encrypted password and payment-card
//! storage behind session, OAuth and bearer-token authentication.

use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nopass_server::{
    routes, AppState, Config, ConsoleMailSender, InMemorySessionStore, InMemoryVaultStore,
    MailSender, SessionStore, SmtpConfig, SmtpMailSender, SqliteStore, VaultStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nopass_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(?config, "Loaded configuration");

    // Pick the mail sender: SMTP when configured, console otherwise
    let mail_sender: Box<dyn MailSender> = match SmtpConfig::from_env() {
        Some(smtp) => match SmtpMailSender::new(smtp) {
            Ok(sender) => Box::new(sender),
            Err(e) => {
                tracing::warn!(error = %e, "SMTP unavailable, falling back to console sender");
                Box::new(ConsoleMailSender::new())
            }
        },
        None => {
            tracing::info!("No SMTP configuration, using console mail sender");
            Box::new(ConsoleMailSender::new())
        }
    };

    // Pick the storage backend: SQLite when a path is configured
    match config.database_path.clone() {
        Some(path) => {
            let store = SqliteStore::open(&path)
                .map_err(|e| anyhow::anyhow!("failed to open database: {e}"))?;
            tracing::info!(path = %path, "Using SQLite storage");
            serve(config, store.clone(), store, mail_sender).await
        }
        None => {
            tracing::info!("Using in-memory storage");
            serve(
                config,
                InMemoryVaultStore::new(),
                InMemorySessionStore::new(),
                mail_sender,
            )
            .await
        }
    }
}

async fn serve<S, N, M>(config: Config, store: S, session_store: N, mail_sender: M) -> Result<()>
where
    S: VaultStore + 'static,
    N: SessionStore + 'static,
    M: MailSender + 'static,
{
    let port = config.port;
    let state = Arc::new(AppState::new(config, store, session_store, mail_sender));
    let app = routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Vault listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
