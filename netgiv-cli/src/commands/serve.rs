//! Serve command - run a relay server in the foreground until ctrl-c.

use anyhow::{Context, Result};
use netgiv_server::{Config, Server};
use std::path::Path;
use std::sync::Arc;

use crate::config::Settings;
use crate::ConnectionArgs;

/// Run the serve command.
pub async fn run(args: &ConnectionArgs, server_config: Option<&Path>) -> Result<()> {
    let config = match server_config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load server configuration from {}", path.display()))?,
        None => config_from_client_settings(args)?,
    };

    let server = Arc::new(Server::new(config).context("Failed to start server")?);
    eprintln!(
        "netgiv server listening on {}",
        server.config().server.bind_address
    );

    server
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("Server failed")
}

/// Bind every interface on the client port, with the client token.
fn config_from_client_settings(args: &ConnectionArgs) -> Result<Config> {
    let settings = Settings::resolve(args)?;
    let mut config = Config::with_auth_token(settings.auth_token);
    config.server.bind_address = format!("0.0.0.0:{}", settings.port);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_settings_become_server_config() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConnectionArgs {
            config: Some(dir.path().join("missing.toml")),
            port: Some(9100),
            auth_token: Some("tok".into()),
            ..Default::default()
        };

        let config = config_from_client_settings(&args).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:9100");
        assert_eq!(config.server.auth_token, "tok");
    }

    #[test]
    fn serve_needs_a_token() {
        let dir = tempfile::tempdir().unwrap();
        let args = ConnectionArgs {
            config: Some(dir.path().join("missing.toml")),
            ..Default::default()
        };
        assert!(config_from_client_settings(&args).is_err());
    }
}
