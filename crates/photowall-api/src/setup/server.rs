//! Server startup and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use photowall_core::Config;

/// Start the server and run until Ctrl+C or SIGTERM.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = config.bind_addr();
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        base_url = %config.base_url,
        max_upload_mb = config.max_upload_bytes / 1024 / 1024,
        derivation_mode = ?config.derivation_mode,
        serve_media = config.serve_media,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(photowall_infra::shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
