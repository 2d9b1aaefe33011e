//! Homeledger API Server
//!
//! Main entry point for the Homeledger backend service.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homeledger_api::{AppState, create_router};
use homeledger_core::ledger::{AccountDirectory, ChartOfAccounts, StaticDirectory};
use homeledger_core::{Bookkeeper, EngineSettings, InMemoryStore};
use homeledger_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homeledger=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Seed the account directory
    let chart = ChartOfAccounts::from_seeds(&config.ledger.chart).context("invalid chart of accounts")?;
    info!(accounts = chart.len(), book_id = %config.ledger.book_id, "Chart of accounts loaded");
    let directory: Arc<dyn AccountDirectory> = Arc::new(StaticDirectory::new(chart));

    // Build the engine
    let settings = EngineSettings::from_config(&config.ledger).context("invalid ledger settings")?;
    let bookkeeper = Bookkeeper::new(directory, Arc::new(InMemoryStore::new()), settings);

    // Create application state
    let state = AppState {
        bookkeeper: Arc::new(bookkeeper),
        book_id: config.ledger.book_id,
    };

    // Create router
    let app = create_router(state, Duration::from_secs(config.server.request_timeout_secs));

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
