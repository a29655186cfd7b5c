//! Docent API Server
//!
//! REST API server for the Docent document assistant.

use std::sync::Arc;

use docent_api::{create_router, AppState};
use docent_core::AppConfig;
use docent_rag::build_components;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .init();

    // Wire the pipeline (embedding client, vector store, chat client).
    // For the remote backend this runs the startup heartbeat and logs,
    // but never aborts, when the store is unreachable.
    let rag = build_components(&config).await?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, rag));
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Docent API listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
