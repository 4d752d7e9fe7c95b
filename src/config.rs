//! TOML configuration.
//!
//! ```toml
//! [db]
//! path = "./data/docstash.sqlite"
//!
//! [processing]
//! endpoint = "http://localhost:5000/processDocument"
//! timeout_secs = 60
//! default_language = "english"
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Only `[db]` is required. `RUST_LOG` overrides `logging.level`.

use anyhow::{Context, Result};
use docstash_core::Language;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-request timeout. Absent means the HTTP client's own default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Used when no language preference has been stored.
    #[serde(default = "default_language")]
    pub default_language: Language,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: None,
            default_language: default_language(),
        }
    }
}

fn default_endpoint() -> String {
    "http://localhost:5000/processDocument".to_string()
}
fn default_language() -> Language {
    Language::English
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    let endpoint = config.processing.endpoint.as_str();
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        anyhow::bail!(
            "processing.endpoint must be an http:// or https:// URL, got '{}'",
            endpoint
        );
    }

    if config.processing.timeout_secs == Some(0) {
        anyhow::bail!("processing.timeout_secs must be > 0");
    }

    if config.logging.level.trim().is_empty() {
        anyhow::bail!("logging.level must not be empty");
    }

    Ok(config)
}
