//! Client settings for the netgiv CLI.
//!
//! Values come from `~/.config/netgiv/config.toml`, overridden by
//! `NETGIV_*` environment variables and flags (clap resolves those two).

use anyhow::{Context, Result};
use netgiv_client::{Client, ClientConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::ConnectionArgs;

/// Address used when nothing is configured.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1";

/// Port used when nothing is configured.
pub const DEFAULT_PORT: u16 = 4512;

/// Contents of the config file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Server host name or IP.
    pub address: Option<String>,
    /// Server port.
    pub port: Option<u16>,
    /// Shared auth token.
    pub auth_token: Option<String>,
}

impl FileConfig {
    /// Load a config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()))
            }
        };
        toml::from_str(&contents).with_context(|| format!("Invalid config file {}", path.display()))
    }
}

/// Resolved connection settings.
#[derive(Clone)]
pub struct Settings {
    pub address: String,
    pub port: u16,
    pub auth_token: String,
}

impl Settings {
    /// Merge flags and environment over the config file.
    pub fn resolve(args: &ConnectionArgs) -> Result<Self> {
        let path = match &args.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let file = FileConfig::load(&path)?;
        Self::merge(args, file, &path)
    }

    fn merge(args: &ConnectionArgs, file: FileConfig, path: &Path) -> Result<Self> {
        let auth_token = args
            .auth_token
            .clone()
            .or(file.auth_token)
            .filter(|token| !token.is_empty())
            .with_context(|| {
                format!(
                    "No auth token configured. Set NETGIV_AUTHTOKEN, pass --auth-token, or add auth_token to {}",
                    path.display()
                )
            })?;

        Ok(Self {
            address: args
                .address
                .clone()
                .or(file.address)
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            auth_token,
        })
    }

    /// `host:port` to dial.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// A client for these settings.
    pub fn client(&self) -> Client {
        Client::new(ClientConfig::new(self.endpoint(), self.auth_token.clone()))
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("address", &self.address)
            .field("port", &self.port)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// `~/.config/netgiv/config.toml` on Linux, the platform equivalent elsewhere.
pub fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "netgiv")
        .context("Could not determine home directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ConnectionArgs {
        ConnectionArgs::default()
    }

    #[test]
    fn defaults_fill_missing_values() {
        let file = FileConfig {
            auth_token: Some("t".into()),
            ..Default::default()
        };
        let settings = Settings::merge(&args(), file, Path::new("c.toml")).unwrap();
        assert_eq!(settings.endpoint(), "127.0.0.1:4512");
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig {
            address: Some("file-host".into()),
            port: Some(1),
            auth_token: Some("file-token".into()),
        };
        let args = ConnectionArgs {
            address: Some("flag-host".into()),
            auth_token: Some("flag-token".into()),
            ..Default::default()
        };

        let settings = Settings::merge(&args, file, Path::new("c.toml")).unwrap();
        assert_eq!(settings.endpoint(), "flag-host:1");
        assert_eq!(settings.auth_token, "flag-token");
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = Settings::merge(&args(), FileConfig::default(), Path::new("c.toml")).unwrap_err();
        assert!(err.to_string().contains("auth token"));
    }

    #[test]
    fn empty_token_is_missing() {
        let file = FileConfig {
            auth_token: Some(String::new()),
            ..Default::default()
        };
        assert!(Settings::merge(&args(), file, Path::new("c.toml")).is_err());
    }

    #[test]
    fn load_reads_toml_and_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        assert!(FileConfig::load(&path).unwrap().auth_token.is_none());

        std::fs::write(&path, "address = \"clip.lan\"\nport = 9000\nauth_token = \"s3\"\n").unwrap();
        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.address.as_deref(), Some("clip.lan"));
        assert_eq!(file.port, Some(9000));
        assert_eq!(file.auth_token.as_deref(), Some("s3"));
    }

    #[test]
    fn load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();
        assert!(FileConfig::load(&path).is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let settings = Settings {
            address: "h".into(),
            port: 1,
            auth_token: "hunter2".into(),
        };
        assert!(!format!("{:?}", settings).contains("hunter2"));
    }
}
