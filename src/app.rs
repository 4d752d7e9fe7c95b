//! Wiring from configuration to a ready [`LifecycleController`].

use std::sync::Arc;

use anyhow::Result;
use docstash_core::kv::KeyValueStore;
use docstash_core::preferences::LanguagePreference;
use docstash_core::{Language, LifecycleController};

use crate::config::Config;
use crate::db;
use crate::http_processor::HttpProcessor;
use crate::migrate;
use crate::sqlite_store::SqliteStore;

/// Open the configured database, creating the schema if needed.
pub async fn open_store(config: &Config) -> Result<Arc<SqliteStore>> {
    let pool = db::connect(&config.db.path).await?;
    migrate::apply(&pool).await?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

pub struct App {
    pub store: Arc<SqliteStore>,
    pub controller: LifecycleController,
    pub preferences: LanguagePreference,
    default_language: Language,
}

impl App {
    pub async fn open(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;
        let processor = Arc::new(HttpProcessor::from_config(&config.processing)?);
        let kv: Arc<dyn KeyValueStore> = store.clone();
        Ok(Self {
            controller: LifecycleController::new(kv.clone(), processor),
            preferences: LanguagePreference::new(kv),
            store,
            default_language: config.processing.default_language,
        })
    }

    /// The stored preference, else the configured default.
    pub async fn language(&self) -> Language {
        self.preferences
            .load()
            .await
            .unwrap_or(self.default_language)
    }

    pub async fn close(self) {
        self.store.pool().close().await;
    }
}
