//! Backend abstraction for page metadata and annotation persistence.

mod memory;

#[cfg(feature = "http")]
mod http;

pub use memory::MemoryBackend;

#[cfg(feature = "http")]
pub use http::HttpBackend;

use crate::annotation::{Annotation, AnnotationId, NewAnnotation};
use crate::document::{DocumentId, DocumentInfo, PageInfo};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Backend errors.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rejected by backend: {0}")]
    Rejected(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Backend error: {0}")]
    Other(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Boxed future for async operations (single-threaded executors included).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Trait for the service that stores page metadata and annotations.
///
/// Implementations may talk to a remote server or keep everything in memory.
pub trait Backend: Send + Sync {
    /// All registered documents.
    fn documents(&self) -> BoxFuture<'_, BackendResult<Vec<DocumentInfo>>>;

    /// One registered document.
    fn document(&self, document_id: DocumentId) -> BoxFuture<'_, BackendResult<DocumentInfo>> {
        Box::pin(async move {
            self.documents()
                .await?
                .into_iter()
                .find(|d| d.id == document_id)
                .ok_or_else(|| BackendError::NotFound(format!("document {}", document_id)))
        })
    }

    /// Raster metadata for one page.
    fn page(&self, document_id: DocumentId, page_number: u32) -> BoxFuture<'_, BackendResult<PageInfo>>;

    /// Encoded raster served at a page's `image_url`.
    ///
    /// `None` means this backend does not serve rasters.
    fn page_image(&self, image_url: &str) -> BoxFuture<'_, BackendResult<Option<Vec<u8>>>> {
        let _ = image_url;
        Box::pin(async { Ok(None) })
    }

    /// Annotations of one page, in the backend's display order.
    fn annotations(
        &self,
        document_id: DocumentId,
        page_number: u32,
    ) -> BoxFuture<'_, BackendResult<Vec<Annotation>>>;

    /// Persist a new annotation and return the stored record.
    fn create_annotation(&self, request: &NewAnnotation) -> BoxFuture<'_, BackendResult<Annotation>>;

    /// Delete one annotation.
    fn delete_annotation(&self, id: AnnotationId) -> BoxFuture<'_, BackendResult<()>>;
}

/// JSON reply envelope used by the HTTP backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Reply<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Unwrap the envelope into its payload.
    pub fn into_result(self) -> BackendResult<T> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(BackendError::Serialization(
                "reply marked successful but has no data".to_string(),
            )),
            (false, _) => Err(BackendError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}

impl Reply<()> {
    /// Successful reply without a payload.
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    /// Check the envelope of a reply that carries no payload.
    pub fn into_unit(self) -> BackendResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(BackendError::Rejected(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }
}
