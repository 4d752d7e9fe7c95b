//! Per-document payload storage.
//!
//! A document's payload lives under two keys derived from its
//! [`DocumentId`]: `image_<id>` holds the image reference and
//! `response_<id>` holds the result text encoded as a JSON string.
//! [`RecordStore::put`] writes both keys in one `insert_new`, so a record is
//! never left half-written and never overwrites another document's record.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::kv::KeyValueStore;
use crate::models::{DocumentId, DocumentRecord, StoredDocument};

pub struct RecordStore {
    store: Arc<dyn KeyValueStore>,
}

/// Which removals failed during [`RecordStore::delete`].
#[derive(Debug, Default)]
pub struct DeleteReport {
    pub image_error: Option<anyhow::Error>,
    pub response_error: Option<anyhow::Error>,
}

impl DeleteReport {
    pub fn is_clean(&self) -> bool {
        self.image_error.is_none() && self.response_error.is_none()
    }
}

impl RecordStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Write the image reference and the serialized result text for `id`.
    ///
    /// Returns `Ok(false)`, writing nothing, when either key for `id` is
    /// already taken.
    pub async fn put(&self, id: &DocumentId, image_ref: &str, result_text: &str) -> Result<bool> {
        let response_json = serde_json::to_string(result_text)?;
        let entries = vec![
            (id.image_key(), image_ref.to_string()),
            (id.response_key(), response_json),
        ];
        self.store
            .insert_new(&entries)
            .await
            .with_context(|| format!("writing record {}", id))
    }

    /// Resolve a pointer into its payload.
    ///
    /// Absent, unreadable, or undecodable fields come back as `None`; this
    /// never fails so a placeholder row can still be shown.
    pub async fn get(&self, pointer: &DocumentRecord) -> StoredDocument {
        let image_uri = self.read_key(&pointer.image_key).await;
        let response = match self.read_key(&pointer.response_key).await {
            Some(raw) => match serde_json::from_str::<String>(&raw) {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::warn!(
                        key = %pointer.response_key,
                        error = %e,
                        "stored response is not a JSON string; treating as absent"
                    );
                    None
                }
            },
            None => None,
        };
        StoredDocument {
            image_uri,
            response,
        }
    }

    /// Remove both keys for `id`, attempting each independently.
    pub async fn delete(&self, id: &DocumentId) -> DeleteReport {
        self.delete_pointer(&DocumentRecord::for_id(id)).await
    }

    /// Remove the exact keys a pointer names.
    ///
    /// Pointers written by older versions may carry keys that do not follow
    /// the `<prefix><id>` pattern, so the stored keys are used as-is.
    pub async fn delete_pointer(&self, pointer: &DocumentRecord) -> DeleteReport {
        let mut report = DeleteReport::default();
        if let Err(e) = self.store.remove(&pointer.image_key).await {
            tracing::warn!(key = %pointer.image_key, error = %format!("{:#}", e), "failed to remove image key");
            report.image_error = Some(e);
        }
        if let Err(e) = self.store.remove(&pointer.response_key).await {
            tracing::warn!(key = %pointer.response_key, error = %format!("{:#}", e), "failed to remove response key");
            report.response_error = Some(e);
        }
        report
    }

    /// Both keys for `id` resolve.
    pub async fn exists(&self, id: &DocumentId) -> bool {
        self.get(&DocumentRecord::for_id(id)).await.is_complete()
    }

    async fn read_key(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = %key, error = %format!("{:#}", e), "failed to read record key");
                None
            }
        }
    }
}
