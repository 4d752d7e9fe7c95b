//! Document reference index.
//!
//! The ordered list of [`DocumentRecord`] pointers, persisted as one JSON
//! blob under [`SAVED_REFERENCES_KEY`]. It is the single source of truth for
//! which documents exist: a document is listed if and only if its pointer is
//! here.
//!
//! # Invariants
//!
//! - Insertion order is preserved; the most recently saved pointer is last.
//! - The blob is always rewritten whole, never patched.
//! - Every mutation is one [`KeyValueStore::update`], so concurrent
//!   `append`/`remove` calls cannot clobber each other, even from separate
//!   processes sharing a store.
//! - `load` never fails: an absent, unreadable, or corrupt blob reads as empty.
//! - Mutations refuse to run when the blob cannot be read at all, so a
//!   transient store failure never overwrites the index with a fragment.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::kv::KeyValueStore;
use crate::models::DocumentRecord;

/// Storage key of the serialized index.
pub const SAVED_REFERENCES_KEY: &str = "savedReferences";

pub struct ReferenceIndex {
    store: Arc<dyn KeyValueStore>,
}

impl ReferenceIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current pointers in insertion order; empty when the blob is absent or corrupt.
    pub async fn load(&self) -> Vec<DocumentRecord> {
        match self.store.get(SAVED_REFERENCES_KEY).await {
            Ok(raw) => parse(raw.as_deref()),
            Err(e) => {
                tracing::warn!(error = %format!("{:#}", e), "treating document index as empty");
                Vec::new()
            }
        }
    }

    /// Whether a pointer with this image key is present.
    pub async fn contains(&self, image_key: &str) -> bool {
        self.load().await.iter().any(|r| r.image_key == image_key)
    }

    /// Append `record` and write the full sequence back.
    pub async fn append(&self, record: DocumentRecord) -> Result<()> {
        self.store
            .update(SAVED_REFERENCES_KEY, &mut |raw: Option<String>| -> Result<Option<String>> {
                let mut records = parse(raw.as_deref());
                records.push(record.clone());
                Ok(Some(serde_json::to_string(&records)?))
            })
            .await
            .context("updating document index")
    }

    /// Drop every pointer whose image key equals `image_key`.
    ///
    /// Returns how many pointers were removed. When nothing matches the
    /// blob is left untouched.
    pub async fn remove(&self, image_key: &str) -> Result<usize> {
        self.retain(|r| r.image_key != image_key).await
    }

    /// Keep only the pointers for which `keep` returns true.
    pub async fn retain<F>(&self, mut keep: F) -> Result<usize>
    where
        F: FnMut(&DocumentRecord) -> bool + Send,
    {
        let mut removed = 0;
        self.store
            .update(SAVED_REFERENCES_KEY, &mut |raw: Option<String>| -> Result<Option<String>> {
                let mut records = parse(raw.as_deref());
                let before = records.len();
                records.retain(|r| keep(r));
                removed = before - records.len();
                if removed == 0 {
                    return Ok(None);
                }
                Ok(Some(serde_json::to_string(&records)?))
            })
            .await
            .context("updating document index")?;
        Ok(removed)
    }
}

/// Decode the stored blob; a corrupt blob reads as empty.
fn parse(raw: Option<&str>) -> Vec<DocumentRecord> {
    let Some(json) = raw else {
        return Vec::new();
    };
    match serde_json::from_str(json) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "document index is corrupt; treating as empty");
            Vec::new()
        }
    }
}
