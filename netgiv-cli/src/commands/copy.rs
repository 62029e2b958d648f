//! Store stdin or a file on the server.

use anyhow::{Context, Result};
use netgiv_client::Client;
use std::path::Path;

/// Run the copy command.
pub async fn run(client: &Client, file: Option<&Path>, name: Option<String>) -> Result<()> {
    let receipt = match file {
        Some(path) => {
            let input = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let name = name.unwrap_or_else(|| file_name(path));
            client.copy(&name, input).await
        }
        None => {
            client
                .copy(name.as_deref().unwrap_or_default(), tokio::io::stdin())
                .await
        }
    }
    .context("Copy failed")?;

    eprintln!(
        "Stored {} ({}, {} bytes)",
        receipt.id, receipt.kind, receipt.size
    );
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
