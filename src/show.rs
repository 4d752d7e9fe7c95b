//! `docstash show`: print one saved document.

use anyhow::{bail, Result};
use docstash_core::DocumentId;

use crate::app::App;
use crate::config::Config;
use crate::list::format_saved_at;

pub async fn run_show(config: &Config, id: &str) -> Result<()> {
    let app = App::open(config).await?;
    let entry = app.controller.open(&DocumentId::new(id)).await;
    app.close().await;

    let Some(entry) = entry else {
        bail!("document not found: {}", id);
    };

    println!("--- Document ---");
    println!("id:        {}", entry.id);
    println!("saved_at:  {}", format_saved_at(&entry));
    println!(
        "image:     {}",
        entry.image_uri.as_deref().unwrap_or("(missing)")
    );
    println!();
    match entry.server_response.as_deref() {
        Some(text) => println!("{}", text),
        None => println!("(no stored result)"),
    }
    Ok(())
}
