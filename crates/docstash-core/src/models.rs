//! Core data types shared by the index, the record store, and the
//! lifecycle controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the key holding a document's image reference.
pub const IMAGE_KEY_PREFIX: &str = "image_";
/// Prefix of the key holding a document's serialized result text.
pub const RESPONSE_KEY_PREFIX: &str = "response_";

/// Opaque identifier of one saved capture.
///
/// Generated from a millisecond clock reading by [`crate::id::IdGenerator`];
/// the storage keys of a document are derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `image_<id>`
    pub fn image_key(&self) -> String {
        format!("{}{}", IMAGE_KEY_PREFIX, self.0)
    }

    /// `response_<id>`
    pub fn response_key(&self) -> String {
        format!("{}{}", RESPONSE_KEY_PREFIX, self.0)
    }

    /// Recover the id from an index pointer's image key.
    ///
    /// Keys without the `image_` prefix are taken whole, so hand-edited
    /// or legacy pointers still get a stable, deletable id.
    pub fn from_image_key(key: &str) -> Self {
        match key.strip_prefix(IMAGE_KEY_PREFIX) {
            Some(rest) if !rest.is_empty() => Self(rest.to_string()),
            _ => Self(key.to_string()),
        }
    }

    /// Numeric value of the id, if it is a clock reading.
    pub fn millis(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Pointer pair describing one saved document.
///
/// Serialized with camelCase field names; this is the element type of the
/// `savedReferences` blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub image_key: String,
    pub response_key: String,
}

impl DocumentRecord {
    pub fn for_id(id: &DocumentId) -> Self {
        Self {
            image_key: id.image_key(),
            response_key: id.response_key(),
        }
    }

    pub fn id(&self) -> DocumentId {
        DocumentId::from_image_key(&self.image_key)
    }
}

/// Payload resolved from the record store for one pointer.
///
/// Either field is `None` when its key is absent or unreadable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredDocument {
    pub image_uri: Option<String>,
    pub response: Option<String>,
}

impl StoredDocument {
    pub fn is_complete(&self) -> bool {
        self.image_uri.is_some() && self.response.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.image_uri.is_none() && self.response.is_none()
    }
}

/// One row of the document list: a pointer joined with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub id: DocumentId,
    pub image_uri: Option<String>,
    pub server_response: Option<String>,
}

impl DocumentEntry {
    pub fn from_parts(record: &DocumentRecord, stored: StoredDocument) -> Self {
        Self {
            id: record.id(),
            image_uri: stored.image_uri,
            server_response: stored.response,
        }
    }

    /// Both payload fields missing: the pointer outlived its record.
    pub fn is_orphaned(&self) -> bool {
        self.image_uri.is_none() && self.server_response.is_none()
    }
}

/// Reference to a captured image, as handed back by the capture collaborator.
///
/// Usually a `file://` URI or a plain local path; opaque to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Local filesystem path for the reference, with any `file://` prefix removed.
    pub fn local_path(&self) -> &str {
        self.0.strip_prefix("file://").unwrap_or(&self.0)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
