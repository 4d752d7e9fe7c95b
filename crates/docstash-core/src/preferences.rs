//! Stored target-language preference.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::kv::KeyValueStore;
use crate::language::Language;

/// Storage key of the preferred language tag.
pub const PREFERRED_LANGUAGE_KEY: &str = "preferredLanguage";

pub struct LanguagePreference {
    store: Arc<dyn KeyValueStore>,
}

impl LanguagePreference {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored language, or `None` if unset, unreadable, or unknown.
    pub async fn load(&self) -> Option<Language> {
        let raw = match self.store.get(PREFERRED_LANGUAGE_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "failed to read language preference");
                return None;
            }
        };
        match raw.parse() {
            Ok(lang) => Some(lang),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring stored language preference");
                None
            }
        }
    }

    pub async fn store(&self, language: Language) -> Result<()> {
        self.store
            .set(PREFERRED_LANGUAGE_KEY, language.tag())
            .await
            .context("writing language preference")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::memory::MemoryStore;

    #[tokio::test]
    async fn test_store_and_load() {
        let store = Arc::new(MemoryStore::new());
        let prefs = LanguagePreference::new(store.clone());
        assert_eq!(prefs.load().await, None);

        prefs.store(Language::Japanese).await.unwrap();
        assert_eq!(prefs.load().await, Some(Language::Japanese));
        assert_eq!(
            store.get(PREFERRED_LANGUAGE_KEY).await.unwrap(),
            Some("japanese".to_string())
        );
    }

    #[tokio::test]
    async fn test_unknown_value_reads_as_none() {
        let store = Arc::new(MemoryStore::new());
        store.insert_raw(PREFERRED_LANGUAGE_KEY, "elvish");
        let prefs = LanguagePreference::new(store);
        assert_eq!(prefs.load().await, None);
    }
}
