//! Show stored objects.

use anyhow::{Context, Result};
use netgiv_client::Client;
use netgiv_types::ListEntry;

/// Run the list command.
pub async fn run(client: &Client, json: bool) -> Result<()> {
    let entries = client.list().await.context("List failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No stored objects");
        return Ok(());
    }

    let now = now_secs();
    print!("{}", render_table(&entries, now));
    Ok(())
}

fn render_table(entries: &[ListEntry], now: u64) -> String {
    let mut out = format!(
        "{:>6}  {:<26}  {:>10}  {:<10}  {}\n",
        "ID", "KIND", "SIZE", "CREATED", "NAME"
    );
    for entry in entries {
        out.push_str(&format!(
            "{:>6}  {:<26}  {:>10}  {:<10}  {}\n",
            entry.id.value(),
            entry.kind,
            format_size(entry.size),
            format_age(now, entry.created_at),
            entry.filename
        ));
    }
    out
}

fn format_size(bytes: u32) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Relative age of a Unix timestamp.
fn format_age(now: u64, created_at: u64) -> String {
    let diff = now.saturating_sub(created_at);
    if diff < 60 {
        format!("{}s ago", diff)
    } else if diff < 3600 {
        format!("{}m ago", diff / 60)
    } else if diff < 86400 {
        format!("{}h ago", diff / 3600)
    } else {
        format!("{}d ago", diff / 86400)
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
