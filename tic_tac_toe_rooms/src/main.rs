use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tic_tac_toe_rooms::{app_state::AppState, config::Config, routes};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log))
        .init();

    let store = config
        .open_store()
        .await
        .context("failed to open room store")?;
    let app_state = Arc::new(AppState::new(store));
    let app = routes::router(app_state);

    let listener = TcpListener::bind(config.addr())
        .await
        .with_context(|| format!("failed to bind to {}", config.addr()))?;

    info!("Server is running on {}", listener.local_addr()?);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Server error: {}", e);
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("❌ Failed to listen for shutdown signal: {}", e);
    }
}
