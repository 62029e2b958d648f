//! netgiv-server binary entry point.
//!
//! Usage:
//! ```bash
//! netgiv-server --config netgiv-server.toml
//! ```

use anyhow::{Context, Result};
use netgiv_server::{Config, Server};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = get_config_path();
    let config = Config::from_file(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    tracing::info!("netgiv-server v{}", env!("CARGO_PKG_VERSION"));
    let server = Arc::new(Server::new(config).context("Failed to start server")?);

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("Server failed")?;

    Ok(())
}

fn get_config_path() -> PathBuf {
    std::env::args()
        .skip_while(|arg| arg != "--config")
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("netgiv-server.toml"))
}
