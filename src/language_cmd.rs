//! `docstash language`: show, set, or list the target language.

use anyhow::Result;
use docstash_core::Language;

use crate::app::App;
use crate::config::Config;

pub fn run_language_list() {
    for lang in Language::ALL {
        println!("{}", lang);
    }
}

pub async fn run_language_show(config: &Config) -> Result<()> {
    let app = App::open(config).await?;
    let stored = app.preferences.load().await;
    let effective = app.language().await;
    app.close().await;

    match stored {
        Some(lang) => println!("{}", lang),
        None => println!("{} (default)", effective),
    }
    Ok(())
}

pub async fn run_language_set(config: &Config, language: Language) -> Result<()> {
    let app = App::open(config).await?;
    let result = app.preferences.store(language).await;
    app.close().await;
    result?;

    println!("Preferred language set to {}.", language);
    Ok(())
}
