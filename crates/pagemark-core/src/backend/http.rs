//! HTTP client for the reference backend server.

use super::{Backend, BackendError, BackendResult, BoxFuture, Reply};
use crate::annotation::{Annotation, AnnotationId, NewAnnotation};
use crate::document::{DocumentId, DocumentInfo, PageInfo};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::time::Duration;
use url::Url;

/// Request timeout for backend calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Largest page raster accepted from the server.
const MAX_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Backend that talks JSON over HTTP to a `pagemark-server` instance.
///
/// Requests block inside the returned futures, like the file storage of a
/// desktop build; drive them from a dedicated executor.
pub struct HttpBackend {
    base: Url,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:3030`).
    pub fn new(base_url: &str) -> BackendResult<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| BackendError::Other(format!("Invalid backend URL {}: {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("pagemark")
            .build();
        Ok(Self { base, agent })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str) -> BackendResult<Url> {
        self.base
            .join(path)
            .map_err(|e| BackendError::Other(format!("Invalid endpoint {}: {}", path, e)))
    }

    fn read_json<T: DeserializeOwned>(response: ureq::Response) -> BackendResult<T> {
        response
            .into_json::<T>()
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

/// Map a ureq error, extracting the server's error message when present.
fn map_error(err: ureq::Error) -> BackendError {
    match err {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<Reply<serde_json::Value>>()
                .ok()
                .and_then(|reply| reply.error)
                .unwrap_or_else(|| format!("HTTP {}", status));
            if status == 404 {
                BackendError::NotFound(message)
            } else {
                BackendError::Rejected(message)
            }
        }
        ureq::Error::Transport(transport) => BackendError::Transport(transport.to_string()),
    }
}

impl Backend for HttpBackend {
    fn documents(&self) -> BoxFuture<'_, BackendResult<Vec<DocumentInfo>>> {
        Box::pin(async move {
            let url = self.endpoint("api/documents")?;
            log::debug!("GET {}", url);
            let response = self.agent.get(url.as_str()).call().map_err(map_error)?;
            Self::read_json::<Reply<Vec<DocumentInfo>>>(response)?.into_result()
        })
    }

    fn page(&self, document_id: DocumentId, page_number: u32) -> BoxFuture<'_, BackendResult<PageInfo>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("api/documents/{}/pages/{}", document_id, page_number))?;
            log::debug!("GET {}", url);
            let response = self.agent.get(url.as_str()).call().map_err(map_error)?;
            Self::read_json::<Reply<PageInfo>>(response)?.into_result()
        })
    }

    fn page_image(&self, image_url: &str) -> BoxFuture<'_, BackendResult<Option<Vec<u8>>>> {
        // Server URLs are rooted; resolve them below the base path.
        let url = self.endpoint(image_url.trim_start_matches('/'));
        Box::pin(async move {
            let url = url?;
            log::debug!("GET {}", url);
            let response = self.agent.get(url.as_str()).call().map_err(map_error)?;
            let mut bytes = Vec::new();
            response
                .into_reader()
                .take(MAX_IMAGE_BYTES)
                .read_to_end(&mut bytes)
                .map_err(|e| BackendError::Transport(e.to_string()))?;
            Ok(Some(bytes))
        })
    }

    fn annotations(
        &self,
        document_id: DocumentId,
        page_number: u32,
    ) -> BoxFuture<'_, BackendResult<Vec<Annotation>>> {
        Box::pin(async move {
            let url = self.endpoint(&format!(
                "api/documents/{}/pages/{}/annotations",
                document_id, page_number
            ))?;
            log::debug!("GET {}", url);
            let response = self.agent.get(url.as_str()).call().map_err(map_error)?;
            Self::read_json(response)
        })
    }

    fn create_annotation(&self, request: &NewAnnotation) -> BoxFuture<'_, BackendResult<Annotation>> {
        let body = serde_json::to_value(request);
        Box::pin(async move {
            let body = body.map_err(|e| BackendError::Serialization(e.to_string()))?;
            let url = self.endpoint("api/annotations")?;
            log::debug!("POST {}", url);
            let response = self
                .agent
                .post(url.as_str())
                .send_json(body)
                .map_err(map_error)?;
            Self::read_json::<Reply<Annotation>>(response)?.into_result()
        })
    }

    fn delete_annotation(&self, id: AnnotationId) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            let url = self.endpoint(&format!("api/annotations/{}", id))?;
            log::debug!("DELETE {}", url);
            let response = self.agent.delete(url.as_str()).call().map_err(map_error)?;
            Self::read_json::<Reply<()>>(response)?.into_unit()
        })
    }
}
