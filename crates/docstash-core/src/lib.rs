//! # docstash Core
//!
//! Storage-agnostic logic for docstash: the data model, the key-value
//! persistence contract, the document reference index, the per-document
//! record store, and the lifecycle controller that ties a capture to an
//! upload and a durable record.
//!
//! This crate contains no sqlx, HTTP client, or filesystem I/O. The
//! application crate supplies a [`kv::KeyValueStore`] and a
//! [`processor::DocumentProcessor`] and drives the
//! [`lifecycle::LifecycleController`].
//!
//! ## Key space
//!
//! | Key | Value | Written by |
//! |-----|-------|------------|
//! | `preferredLanguage` | language tag | [`preferences`] |
//! | `savedReferences` | JSON array of [`models::DocumentRecord`] | [`index`] |
//! | `image_<id>` | image reference | [`records`] |
//! | `response_<id>` | JSON-encoded result text | [`records`] |

pub mod doctor;
pub mod id;
pub mod index;
pub mod kv;
pub mod language;
pub mod lifecycle;
pub mod models;
pub mod preferences;
pub mod processor;
pub mod records;

pub use language::Language;
pub use lifecycle::{LifecycleController, LifecycleError};
pub use models::{DocumentEntry, DocumentId, DocumentRecord};
