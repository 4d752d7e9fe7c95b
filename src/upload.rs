//! `docstash upload`: send one image for processing and optionally save it.

use std::path::Path;

use anyhow::{Context, Result};
use docstash_core::lifecycle::Captured;
use docstash_core::models::ImageRef;
use docstash_core::Language;

use crate::app::App;
use crate::config::Config;

/// Turn a CLI argument into a stable image reference.
///
/// `file://` URIs are kept as given; plain paths are made absolute so the
/// stored reference still resolves from another working directory.
pub fn resolve_image(arg: &str) -> Result<ImageRef> {
    if arg.starts_with("file://") {
        return Ok(ImageRef::new(arg));
    }
    let path = std::fs::canonicalize(Path::new(arg))
        .with_context(|| format!("Image not found: {}", arg))?;
    Ok(ImageRef::new(format!("file://{}", path.display())))
}

pub async fn run_upload(
    config: &Config,
    image: &str,
    language: Option<Language>,
    save: bool,
) -> Result<()> {
    let image = resolve_image(image)?;
    let app = App::open(config).await?;
    let language = match language {
        Some(lang) => lang,
        None => app.language().await,
    };

    let captured = Captured::new(image, language);
    let processed = match app.controller.upload(captured).await {
        Ok(p) => p,
        Err(e) => {
            app.close().await;
            return Err(anyhow::Error::new(e).context("Nothing was saved; run the upload again to retry"));
        }
    };

    println!("{}", processed.text());

    if save {
        let saved = app.controller.save(&processed).await;
        app.close().await;
        let pointer = saved?;
        eprintln!("Saved document {}.", pointer.id());
    } else {
        app.close().await;
        eprintln!("Not saved (pass --save to keep it).");
    }
    Ok(())
}
