//! Write a stored object to stdout or a file.

use anyhow::{Context, Result};
use netgiv_client::Client;
use netgiv_types::ObjectId;
use std::path::Path;

/// Run the paste command.
pub async fn run(client: &Client, id: ObjectId, output: Option<&Path>) -> Result<()> {
    let info = match output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let result = client.paste(id, file).await;
            if result.is_err() {
                // Don't leave an empty or partial file behind
                let _ = tokio::fs::remove_file(path).await;
            }
            result
        }
        None => client.paste(id, tokio::io::stdout()).await,
    }
    .context("Paste failed")?;

    tracing::debug!(filename = %info.filename, kind = %info.kind, size = info.size, "Pasted");
    Ok(())
}
