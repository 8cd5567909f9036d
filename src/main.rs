use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use doc_compare::core::config::service::redacted;
use doc_compare::core::config::ConfigService;
use doc_compare::core::logging;
use doc_compare::server;
use doc_compare::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_service = ConfigService::from_env();
    let config = config_service.load().with_context(|| {
        format!(
            "Failed to load configuration from {}",
            config_service.config_path().display()
        )
    })?;
    logging::init(&config.logging);

    tracing::debug!(config = %redacted(&config), "Configuration loaded");
    if config.llm.credential().is_none() {
        tracing::warn!("No OpenAI API key configured; every comparison will fail until one is set");
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::initialize(config)?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        return;
    }
    tracing::info!("Shutting down");
}
