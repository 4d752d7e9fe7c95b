//! Remote processing client contract.
//!
//! A [`DocumentProcessor`] uploads one image with a target language and
//! returns the endpoint's result text, which the rest of the system treats
//! as opaque. Concrete implementations (the HTTP client) live in the
//! `docstash` app crate.

use async_trait::async_trait;
use thiserror::Error;

use crate::language::Language;
use crate::models::ImageRef;

/// Why an upload produced no result text.
///
/// Every variant is terminal for the attempt; nothing is retried.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("could not read image '{image}': {source}")]
    Image {
        image: String,
        #[source]
        source: std::io::Error,
    },

    #[error("upload timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Trait for remote processing backends.
#[async_trait]
pub trait DocumentProcessor: Send + Sync {
    /// Upload `image` for processing into `language`.
    async fn process(&self, image: &ImageRef, language: Language) -> Result<String, ProcessError>;
}
