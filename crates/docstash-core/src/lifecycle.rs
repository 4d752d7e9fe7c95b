//! Capture → upload → save → list → delete orchestration.
//!
//! [`LifecycleController`] is the only writer of the document index. It
//! moves one document through its states with a typestate flow:
//!
//! ```text
//! Captured ──upload()──▶ Processed ──save()──▶ DocumentRecord
//!     ▲                     │
//!     └── RemoteCall error ─┘ (nothing persisted; retry with the same capture)
//! ```
//!
//! # Ordering
//!
//! - **Save** writes the record first and appends the pointer second. A
//!   crash in between leaves an un-indexed record, never a pointer to
//!   missing data. The record is only written under an id nobody holds
//!   yet, so two processes saving in the same millisecond end up with
//!   different ids.
//! - **Delete** removes the pointer first and reclaims the record second,
//!   with the same consequence: the index never points at data that was
//!   already removed.
//!
//! # Failure handling
//!
//! Every failure is logged and returned as a [`LifecycleError`]; listing
//! never fails. Nothing is retried automatically.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::doctor::{self, DoctorReport};
use crate::id::{IdGenerator, IdsExhausted};
use crate::index::ReferenceIndex;
use crate::kv::KeyValueStore;
use crate::language::Language;
use crate::models::{DocumentEntry, DocumentId, DocumentRecord, ImageRef};
use crate::processor::{DocumentProcessor, ProcessError};
use crate::records::RecordStore;

/// Candidate ids tried by one save before giving up.
const MAX_ID_ATTEMPTS: u32 = 64;

/// An image handed back by the capture collaborator, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    image: ImageRef,
    language: Language,
}

impl Captured {
    pub fn new(image: ImageRef, language: Language) -> Self {
        Self { image, language }
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn language(&self) -> Language {
        self.language
    }
}

/// A successful upload, held in memory until the user saves or discards it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Processed {
    image: ImageRef,
    language: Language,
    text: String,
}

impl Processed {
    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("upload failed: {source}")]
    RemoteCall {
        captured: Captured,
        #[source]
        source: ProcessError,
    },

    #[error("an upload is already in progress")]
    UploadInFlight { captured: Captured },

    #[error("failed to save document {id}: {cause:#}")]
    SaveFailed { id: DocumentId, cause: anyhow::Error },

    #[error("failed to save document: {0}")]
    IdsExhausted(#[from] IdsExhausted),

    #[error("failed to delete document {id}: {cause:#}")]
    DeleteFailed { id: DocumentId, cause: anyhow::Error },
}

impl LifecycleError {
    /// The capture to retry with, for upload errors.
    pub fn into_captured(self) -> Option<Captured> {
        match self {
            LifecycleError::RemoteCall { captured, .. }
            | LifecycleError::UploadInFlight { captured } => Some(captured),
            _ => None,
        }
    }
}

/// What a delete actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// A pointer for the id was present and has been removed.
    pub was_listed: bool,
    /// Both record keys are gone (they may never have existed).
    pub reclaimed: bool,
}

pub struct LifecycleController {
    index: ReferenceIndex,
    records: RecordStore,
    processor: Arc<dyn DocumentProcessor>,
    ids: IdGenerator,
    uploading: AtomicBool,
}

/// Clears the in-flight flag even if the upload future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl LifecycleController {
    pub fn new(store: Arc<dyn KeyValueStore>, processor: Arc<dyn DocumentProcessor>) -> Self {
        Self {
            index: ReferenceIndex::new(store.clone()),
            records: RecordStore::new(store),
            processor,
            ids: IdGenerator::new(),
            uploading: AtomicBool::new(false),
        }
    }

    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Send a capture to the processor.
    ///
    /// On failure nothing has been written; the capture comes back inside
    /// the error for a user-initiated retry.
    pub async fn upload(&self, captured: Captured) -> Result<Processed, LifecycleError> {
        if self
            .uploading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(image = %captured.image, "rejecting upload while another is in flight");
            return Err(LifecycleError::UploadInFlight { captured });
        }
        let _in_flight = InFlight(&self.uploading);

        tracing::info!(image = %captured.image, language = %captured.language, "uploading document");
        match self.processor.process(&captured.image, captured.language).await {
            Ok(text) => {
                tracing::info!(image = %captured.image, bytes = text.len(), "document processed");
                Ok(Processed {
                    image: captured.image,
                    language: captured.language,
                    text,
                })
            }
            Err(source) => {
                tracing::error!(image = %captured.image, error = %source, "upload failed");
                Err(LifecycleError::RemoteCall { captured, source })
            }
        }
    }

    /// Persist a processed document: record first, then pointer.
    pub async fn save(&self, processed: &Processed) -> Result<DocumentRecord, LifecycleError> {
        for existing in self.index.load().await {
            self.ids.observe(&existing.id());
        }

        let mut attempts = 0;
        let id = loop {
            let id = self.ids.next_id().inspect_err(|e| {
                tracing::error!(error = %e, "cannot allocate a document id");
            })?;
            attempts += 1;
            match self
                .records
                .put(&id, processed.image.as_str(), &processed.text)
                .await
            {
                Ok(true) => break id,
                Ok(false) if attempts < MAX_ID_ATTEMPTS => {
                    tracing::debug!(id = %id, "document id taken by another writer; trying the next one");
                }
                Ok(false) => {
                    tracing::error!(id = %id, attempts, "every candidate document id was taken");
                    return Err(LifecycleError::SaveFailed {
                        id,
                        cause: anyhow::anyhow!("no free document id after {} attempts", attempts),
                    });
                }
                Err(cause) => {
                    tracing::error!(id = %id, error = %format!("{:#}", cause), "failed to write document record");
                    return Err(LifecycleError::SaveFailed { id, cause });
                }
            }
        };

        let pointer = DocumentRecord::for_id(&id);
        if let Err(cause) = self.index.append(pointer.clone()).await {
            tracing::error!(
                id = %id,
                error = %format!("{:#}", cause),
                "failed to index document; record left unreferenced"
            );
            return Err(LifecycleError::SaveFailed { id, cause });
        }

        tracing::info!(id = %id, "document saved");
        Ok(pointer)
    }

    /// Every indexed document, in index order.
    ///
    /// Pointers whose record is missing still produce a row with empty
    /// fields so they can be found and deleted.
    pub async fn list(&self) -> Vec<DocumentEntry> {
        let pointers = self.index.load().await;
        let mut entries = Vec::with_capacity(pointers.len());
        for pointer in &pointers {
            let stored = self.records.get(pointer).await;
            let entry = DocumentEntry::from_parts(pointer, stored);
            if entry.is_orphaned() {
                tracing::warn!(id = %entry.id, "indexed document has no stored record");
            }
            entries.push(entry);
        }
        tracing::debug!(count = entries.len(), "listed documents");
        entries
    }

    /// One indexed document, or `None` if no pointer has this id.
    pub async fn open(&self, id: &DocumentId) -> Option<DocumentEntry> {
        let pointer = self.index.load().await.into_iter().find(|p| &p.id() == id)?;
        let stored = self.records.get(&pointer).await;
        Some(DocumentEntry::from_parts(&pointer, stored))
    }

    /// Delete a document: pointer first, then record.
    ///
    /// Deleting an id that is not listed succeeds and still reclaims any
    /// stray record keys for it.
    pub async fn delete(&self, id: &DocumentId) -> Result<DeleteOutcome, LifecycleError> {
        let mut pointers = Vec::new();
        let removed = self
            .index
            .retain(|p| {
                if &p.id() == id {
                    pointers.push(p.clone());
                    false
                } else {
                    true
                }
            })
            .await;
        if let Err(cause) = removed {
            tracing::error!(id = %id, error = %format!("{:#}", cause), "failed to remove document from index");
            return Err(LifecycleError::DeleteFailed {
                id: id.clone(),
                cause,
            });
        }

        let was_listed = !pointers.is_empty();
        if pointers.is_empty() {
            pointers.push(DocumentRecord::for_id(id));
        }

        let mut reclaimed = true;
        for pointer in &pointers {
            if !self.records.delete_pointer(pointer).await.is_clean() {
                reclaimed = false;
            }
        }
        if !reclaimed {
            tracing::warn!(id = %id, "document unlisted but some record keys remain");
        }

        tracing::info!(id = %id, was_listed, "document deleted");
        Ok(DeleteOutcome {
            was_listed,
            reclaimed,
        })
    }

    /// Report index pointers that are dangling, partial, or duplicated.
    pub async fn diagnose(&self) -> DoctorReport {
        doctor::diagnose(&self.index, &self.records).await
    }

    /// Drop dangling and duplicate pointers from the index.
    pub async fn repair(&self) -> anyhow::Result<DoctorReport> {
        doctor::repair(&self.index, &self.records).await
    }
}

/// The document list as last shown to the user.
///
/// Deletions are applied to the view immediately instead of reloading.
#[derive(Debug, Default)]
pub struct DocumentList {
    entries: Vec<DocumentEntry>,
}

impl DocumentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DocumentEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reload from the store.
    pub async fn refresh(&mut self, controller: &LifecycleController) {
        self.entries = controller.list().await;
    }

    /// Remove `id` from the view, then delete it.
    ///
    /// If the index could not be updated the document still exists, so
    /// the row is put back where it was.
    pub async fn delete(
        &mut self,
        controller: &LifecycleController,
        id: &DocumentId,
    ) -> Result<DeleteOutcome, LifecycleError> {
        let position = self.entries.iter().position(|e| &e.id == id);
        let removed = position.map(|pos| (pos, self.entries.remove(pos)));

        match controller.delete(id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                if let Some((pos, entry)) = removed {
                    self.entries.insert(pos, entry);
                }
                Err(e)
            }
        }
    }
}
