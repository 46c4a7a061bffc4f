//! In-memory backend implementation.

use super::{Backend, BackendError, BackendResult, BoxFuture};
use crate::annotation::{Annotation, AnnotationId, NewAnnotation};
use crate::document::{DEFAULT_DPI, DocumentId, DocumentInfo, PageInfo};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

struct Inner {
    documents: BTreeMap<DocumentId, DocumentInfo>,
    annotations: Vec<Annotation>,
    next_id: AnnotationId,
    dpi: u32,
    failing_deletes: HashSet<AnnotationId>,
    fail_loads: bool,
    fail_creates: bool,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
            annotations: Vec::new(),
            next_id: 1,
            dpi: DEFAULT_DPI,
            failing_deletes: HashSet::new(),
            fail_loads: false,
            fail_creates: false,
        }
    }
}

/// In-memory backend for testing and offline use.
///
/// Behaves like the reference server: annotations are listed newest first
/// and page metadata is derived from the registered page size. Failures can
/// be injected per operation.
#[derive(Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

fn lock_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::Other(format!("Lock error: {}", e))
}

impl MemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend holding one document.
    pub fn with_document(document: DocumentInfo) -> Self {
        let backend = Self::new();
        backend.add_document(document);
        backend
    }

    /// Register (or replace) a document.
    pub fn add_document(&self, document: DocumentInfo) {
        if let Ok(mut inner) = self.inner.write() {
            inner.documents.insert(document.id, document);
        }
    }

    /// Set the raster resolution reported for pages.
    pub fn set_dpi(&self, dpi: u32) {
        if let Ok(mut inner) = self.inner.write() {
            inner.dpi = dpi.max(1);
        }
    }

    /// Make every delete of `id` fail.
    pub fn fail_deletes_of(&self, id: AnnotationId) {
        if let Ok(mut inner) = self.inner.write() {
            inner.failing_deletes.insert(id);
        }
    }

    /// Make page and annotation loads fail.
    pub fn set_fail_loads(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.fail_loads = fail;
        }
    }

    /// Make annotation creation fail.
    pub fn set_fail_creates(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.write() {
            inner.fail_creates = fail;
        }
    }

    /// Total number of stored annotations across all pages.
    pub fn annotation_count(&self) -> usize {
        self.inner.read().map(|inner| inner.annotations.len()).unwrap_or(0)
    }
}

impl Backend for MemoryBackend {
    fn documents(&self) -> BoxFuture<'_, BackendResult<Vec<DocumentInfo>>> {
        Box::pin(async move {
            let inner = self.inner.read().map_err(lock_error)?;
            Ok(inner.documents.values().cloned().collect())
        })
    }

    fn page(&self, document_id: DocumentId, page_number: u32) -> BoxFuture<'_, BackendResult<PageInfo>> {
        Box::pin(async move {
            let inner = self.inner.read().map_err(lock_error)?;
            if inner.fail_loads {
                return Err(BackendError::Transport("page load failed".to_string()));
            }
            let document = inner
                .documents
                .get(&document_id)
                .ok_or_else(|| BackendError::NotFound(format!("document {}", document_id)))?;
            if !document.contains_page(page_number) {
                return Err(BackendError::Rejected(format!("Invalid page number {}", page_number)));
            }
            Ok(PageInfo::rendered(document, page_number, inner.dpi))
        })
    }

    fn annotations(
        &self,
        document_id: DocumentId,
        page_number: u32,
    ) -> BoxFuture<'_, BackendResult<Vec<Annotation>>> {
        Box::pin(async move {
            let inner = self.inner.read().map_err(lock_error)?;
            if inner.fail_loads {
                return Err(BackendError::Transport("annotation load failed".to_string()));
            }
            let mut list: Vec<Annotation> = inner
                .annotations
                .iter()
                .filter(|a| a.document_id == document_id && a.page_number == page_number)
                .cloned()
                .collect();
            list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
            Ok(list)
        })
    }

    fn create_annotation(&self, request: &NewAnnotation) -> BoxFuture<'_, BackendResult<Annotation>> {
        let request = request.clone();
        Box::pin(async move {
            let mut inner = self.inner.write().map_err(lock_error)?;
            if inner.fail_creates {
                return Err(BackendError::Rejected("annotation rejected".to_string()));
            }
            let document = inner
                .documents
                .get(&request.document_id)
                .ok_or_else(|| BackendError::NotFound(format!("document {}", request.document_id)))?;
            if !document.contains_page(request.page_number) {
                return Err(BackendError::Rejected(format!(
                    "Invalid page number {}",
                    request.page_number
                )));
            }
            if !request.shape.is_valid() {
                return Err(BackendError::Rejected("Invalid annotation geometry".to_string()));
            }

            let annotation = Annotation {
                id: inner.next_id,
                document_id: request.document_id,
                page_number: request.page_number,
                shape: request.shape,
                scale_factor_at_capture: request.scale_factor_at_capture,
                description: request.description,
                created_at: Utc::now(),
            };
            inner.next_id += 1;
            inner.annotations.push(annotation.clone());
            Ok(annotation)
        })
    }

    fn delete_annotation(&self, id: AnnotationId) -> BoxFuture<'_, BackendResult<()>> {
        Box::pin(async move {
            let mut inner = self.inner.write().map_err(lock_error)?;
            if inner.failing_deletes.contains(&id) {
                return Err(BackendError::Rejected(format!("delete of {} refused", id)));
            }
            let before = inner.annotations.len();
            inner.annotations.retain(|a| a.id != id);
            if inner.annotations.len() == before {
                return Err(BackendError::NotFound(format!("annotation {}", id)));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationShape;
    use crate::testing::block_on;

    fn document() -> DocumentInfo {
        DocumentInfo {
            id: 1,
            filename: "doc.pdf".to_string(),
            page_count: 3,
            page_width: 612.0,
            page_height: 792.0,
        }
    }

    fn request(page_number: u32) -> NewAnnotation {
        NewAnnotation {
            document_id: 1,
            page_number,
            shape: AnnotationShape::Point { x: 10.0, y: 20.0 },
            scale_factor_at_capture: 2.0,
            description: String::new(),
        }
    }

    #[test]
    fn test_document_lookup() {
        let backend = MemoryBackend::with_document(document());
        assert_eq!(block_on(backend.document(1)).unwrap().page_count, 3);
        assert!(matches!(block_on(backend.document(5)), Err(BackendError::NotFound(_))));
    }

    #[test]
    fn test_page_info() {
        let backend = MemoryBackend::with_document(document());
        let info = block_on(backend.page(1, 2)).unwrap();
        assert_eq!(info.dpi, DEFAULT_DPI);
        assert_eq!(info.image_width, 1275);
    }

    #[test]
    fn test_serves_no_rasters() {
        let backend = MemoryBackend::with_document(document());
        let info = block_on(backend.page(1, 1)).unwrap();
        assert_eq!(block_on(backend.page_image(&info.image_url)).unwrap(), None);
    }

    #[test]
    fn test_page_out_of_range() {
        let backend = MemoryBackend::with_document(document());
        assert!(matches!(block_on(backend.page(1, 4)), Err(BackendError::Rejected(_))));
        assert!(matches!(block_on(backend.page(2, 1)), Err(BackendError::NotFound(_))));
    }

    #[test]
    fn test_create_and_list_newest_first() {
        let backend = MemoryBackend::with_document(document());
        let first = block_on(backend.create_annotation(&request(1))).unwrap();
        let second = block_on(backend.create_annotation(&request(1))).unwrap();
        block_on(backend.create_annotation(&request(2))).unwrap();

        let page1 = block_on(backend.annotations(1, 1)).unwrap();
        assert_eq!(page1.len(), 2);
        assert_eq!(page1[0].id, second.id);
        assert_eq!(page1[1].id, first.id);
    }

    #[test]
    fn test_delete() {
        let backend = MemoryBackend::with_document(document());
        let a = block_on(backend.create_annotation(&request(1))).unwrap();
        block_on(backend.delete_annotation(a.id)).unwrap();
        assert_eq!(backend.annotation_count(), 0);
        assert!(matches!(
            block_on(backend.delete_annotation(a.id)),
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn test_injected_failures() {
        let backend = MemoryBackend::with_document(document());
        let a = block_on(backend.create_annotation(&request(1))).unwrap();

        backend.fail_deletes_of(a.id);
        assert!(block_on(backend.delete_annotation(a.id)).is_err());

        backend.set_fail_creates(true);
        assert!(block_on(backend.create_annotation(&request(1))).is_err());

        backend.set_fail_loads(true);
        assert!(block_on(backend.annotations(1, 1)).is_err());
        assert!(block_on(backend.page(1, 1)).is_err());
    }

    #[test]
    fn test_rejects_negative_area() {
        let backend = MemoryBackend::with_document(document());
        let mut req = request(1);
        req.shape = AnnotationShape::Area {
            x: 0.0,
            y: 0.0,
            width: -4.0,
            height: 1.0,
        };
        assert!(block_on(backend.create_annotation(&req)).is_err());
    }
}
