//! # credpass-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment:
//! `PORT`, `AUTH_TOKEN`, `CREDPASS_HASH` for the service and the
//! `CREDPASS_LEDGER_*` variables for the ledger backend.

use credpass_api::state::{AppConfig, AppState};
use credpass_ledger::LedgerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("CREDPASS_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("invalid service configuration: {e}");
        e
    })?;
    if config.auth_token.is_none() {
        tracing::warn!("AUTH_TOKEN not set; authentication is disabled");
    }

    let ledger = LedgerConfig::from_env()
        .map_err(|e| {
            tracing::error!("invalid ledger configuration: {e}");
            e
        })?
        .connect()
        .map_err(|e| {
            tracing::error!("failed to connect ledger: {e}");
            e
        })?;

    let port = config.port;
    let app = credpass_api::app(AppState::with_ledger(config, ledger));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("credpass API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
