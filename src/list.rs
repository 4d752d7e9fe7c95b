//! `docstash list`: one row per indexed document.

use anyhow::Result;
use docstash_core::DocumentEntry;

use crate::app::App;
use crate::config::Config;

const PREVIEW_CHARS: usize = 60;

/// Saved-at time derived from a millisecond id, if it is one.
pub fn format_saved_at(entry: &DocumentEntry) -> String {
    entry
        .id
        .millis()
        .and_then(chrono::DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// First line of the result text, shortened for a table cell.
pub fn preview(text: Option<&str>) -> String {
    let Some(text) = text else {
        return "(missing)".to_string();
    };
    let line = text.lines().next().unwrap_or("").trim();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

pub async fn run_list(config: &Config, newest_first: bool, json: bool) -> Result<()> {
    let app = App::open(config).await?;
    let mut entries = app.controller.list().await;
    app.close().await;

    if newest_first {
        entries.reverse();
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No saved documents.");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{:<15}  {:<19}  {}",
            entry.id,
            format_saved_at(entry),
            preview(entry.server_response.as_deref())
        );
        println!(
            "{:<15}  {:<19}  {}",
            "",
            "",
            entry.image_uri.as_deref().unwrap_or("(image missing)")
        );
    }
    println!("{} document(s)", entries.len());
    Ok(())
}
