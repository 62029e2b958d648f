//! Delete a stored object.

use anyhow::{Context, Result};
use netgiv_client::Client;
use netgiv_types::ObjectId;

/// Run the burn command.
pub async fn run(client: &Client, id: ObjectId) -> Result<()> {
    client.burn(id).await.context("Burn failed")?;
    if id.is_latest() {
        eprintln!("Burned most recent object");
    } else {
        eprintln!("Burned {}", id);
    }
    Ok(())
}
