//! HTTP client for the remote processing endpoint.
//!
//! Sends one `multipart/form-data` POST per upload:
//!
//! | Field | Content |
//! |-------|---------|
//! | `document` | image bytes, file name `uploaded_image.jpg`, type `image/jpeg` |
//! | `language` | language tag, e.g. `french` |
//!
//! A 2xx response body is the result text, returned verbatim. Anything else
//! is a [`ProcessError`]. There is no retry.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use docstash_core::models::ImageRef;
use docstash_core::processor::{DocumentProcessor, ProcessError};
use docstash_core::Language;

use crate::config::ProcessingConfig;

const UPLOAD_FILE_NAME: &str = "uploaded_image.jpg";
const UPLOAD_MIME: &str = "image/jpeg";

pub struct HttpProcessor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProcessor {
    pub fn from_config(config: &ProcessingConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

fn transport_error(e: reqwest::Error) -> ProcessError {
    if e.is_timeout() {
        ProcessError::Timeout
    } else {
        ProcessError::Transport(e.to_string())
    }
}

#[async_trait]
impl DocumentProcessor for HttpProcessor {
    async fn process(&self, image: &ImageRef, language: Language) -> Result<String, ProcessError> {
        let bytes = tokio::fs::read(image.local_path())
            .await
            .map_err(|source| ProcessError::Image {
                image: image.to_string(),
                source,
            })?;

        let document = Part::bytes(bytes)
            .file_name(UPLOAD_FILE_NAME)
            .mime_str(UPLOAD_MIME)
            .map_err(transport_error)?;
        let form = Form::new()
            .part("document", document)
            .text("language", language.tag());

        tracing::debug!(endpoint = %self.endpoint, language = %language, "posting document");
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(ProcessError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(endpoint: &str, timeout_secs: Option<u64>) -> ProcessingConfig {
        ProcessingConfig {
            endpoint: endpoint.to_string(),
            timeout_secs,
            default_language: Language::English,
        }
    }

    #[tokio::test]
    async fn test_missing_image_is_image_error() {
        let processor = HttpProcessor::from_config(&config("http://127.0.0.1:9/x", None)).unwrap();
        let err = processor
            .process(&ImageRef::new("file:///nonexistent/scan.jpg"), Language::French)
            .await
            .unwrap_err();
        match err {
            ProcessError::Image { image, .. } => assert_eq!(image, "file:///nonexistent/scan.jpg"),
            other => panic!("expected Image error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("scan.jpg");
        std::fs::write(&image, b"\xFF\xD8\xFF").unwrap();

        // Port 9 (discard) is essentially never listening.
        let processor =
            HttpProcessor::from_config(&config("http://127.0.0.1:9/processDocument", Some(5)))
                .unwrap();
        let err = processor
            .process(&ImageRef::new(image.to_string_lossy()), Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Transport(_) | ProcessError::Timeout));
    }
}
