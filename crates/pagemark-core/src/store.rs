//! Read-through cache of the current page's annotations.

use crate::annotation::{Annotation, AnnotationId, PendingAnnotation};
use crate::backend::{Backend, BackendError};
use crate::document::DocumentId;
use crate::error::ViewerError;
use futures_util::future::join_all;

/// Identifies the page an annotation set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub document_id: DocumentId,
    pub page_number: u32,
}

impl PageKey {
    pub fn new(document_id: DocumentId, page_number: u32) -> Self {
        Self {
            document_id,
            page_number,
        }
    }
}

/// Cached annotation set of one page.
///
/// The set is only ever replaced wholesale from a backend listing; mutations
/// go to the backend first and are followed by a full reload.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    key: Option<PageKey>,
    annotations: Vec<Annotation>,
    /// Bumped on every replacement, so views can tell when to redraw.
    revision: u64,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Page the cached set belongs to.
    pub fn key(&self) -> Option<PageKey> {
        self.key
    }

    /// Cached annotations in backend order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Position of an annotation in the cached order.
    pub fn index_of(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    /// Drop the cached set and point the cache at `key`.
    pub fn reset(&mut self, key: Option<PageKey>) {
        self.key = key;
        self.annotations.clear();
        self.revision += 1;
    }

    /// Drop the cached set and forget which page it belonged to.
    pub fn invalidate(&mut self) {
        self.reset(None);
    }

    pub(crate) fn replace(&mut self, key: PageKey, annotations: Vec<Annotation>) {
        self.key = Some(key);
        self.annotations = annotations;
        self.revision += 1;
    }

    /// Fetch the annotations of `key` and replace the cache with them.
    ///
    /// On failure the previous cache is left untouched.
    pub async fn load<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        key: PageKey,
    ) -> Result<&[Annotation], ViewerError> {
        match backend.annotations(key.document_id, key.page_number).await {
            Ok(annotations) => {
                log::debug!(
                    "Loaded {} annotations for document {} page {}",
                    annotations.len(),
                    key.document_id,
                    key.page_number
                );
                self.replace(key, annotations);
                Ok(&self.annotations)
            }
            Err(source) => {
                log::error!(
                    "Failed to load annotations for document {} page {}: {}",
                    key.document_id,
                    key.page_number,
                    source
                );
                Err(ViewerError::AnnotationLoad {
                    page: key.page_number,
                    source,
                })
            }
        }
    }

    /// Reload the cached page.
    pub async fn refresh<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<(), ViewerError> {
        let key = self.key.ok_or(ViewerError::NoPage)?;
        self.load(backend, key).await.map(|_| ())
    }

    /// Persist a pending capture for the cached page, then resynchronize.
    ///
    /// `ViewerError::Create` means nothing was stored and the capture can be
    /// retried. A load error after a successful create means the record was
    /// stored but the cache could not be refreshed.
    pub async fn create<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        pending: &PendingAnnotation,
        description: &str,
    ) -> Result<Annotation, ViewerError> {
        let key = self.key.ok_or(ViewerError::NoPage)?;
        let request = pending.to_request(key.document_id, key.page_number, description);
        let annotation = backend.create_annotation(&request).await.map_err(|e| {
            log::error!("Failed to save annotation: {}", e);
            ViewerError::Create(e)
        })?;
        log::info!(
            "Saved {} annotation {} on page {}",
            annotation.kind().name(),
            annotation.id,
            key.page_number
        );
        self.load(backend, key).await?;
        Ok(annotation)
    }

    /// Delete one annotation, then resynchronize.
    pub async fn delete<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        id: AnnotationId,
    ) -> Result<(), ViewerError> {
        let key = self.key.ok_or(ViewerError::NoPage)?;
        backend.delete_annotation(id).await.map_err(|source| {
            log::error!("Failed to delete annotation {}: {}", id, source);
            ViewerError::Delete { id, source }
        })?;
        log::info!("Deleted annotation {}", id);
        self.load(backend, key).await?;
        Ok(())
    }

    /// Delete every cached annotation concurrently, then resynchronize once.
    ///
    /// Returns the number of deletions that succeeded. Failed deletions are
    /// reported together after all attempts finished; succeeded ones stay
    /// deleted. If the reload fails as well, the aggregate error carries it in
    /// `reload` and the cache still holds the pre-clear set.
    ///
    /// Deletions are only as concurrent as the backend's futures: a blocking
    /// backend such as `HttpBackend` completes them one after another.
    pub async fn clear_all<B: Backend + ?Sized>(&mut self, backend: &B) -> Result<usize, ViewerError> {
        let key = self.key.ok_or(ViewerError::NoPage)?;
        let ids: Vec<AnnotationId> = self.annotations.iter().map(|a| a.id).collect();
        let attempted = ids.len();

        let results = join_all(ids.into_iter().map(|id| async move {
            (id, backend.delete_annotation(id).await)
        }))
        .await;
        let errors: Vec<(AnnotationId, BackendError)> = results
            .into_iter()
            .filter_map(|(id, result)| result.err().map(|e| (id, e)))
            .collect();

        let reload = self.load(backend, key).await;

        if !errors.is_empty() {
            log::warn!(
                "Clearing page {}: {} of {} deletions failed",
                key.page_number,
                errors.len(),
                attempted
            );
            return Err(ViewerError::ClearAll {
                failed: errors.len(),
                attempted,
                errors,
                reload: reload.err().map(Box::new),
            });
        }
        reload?;
        log::info!("Cleared {} annotations from page {}", attempted, key.page_number);
        Ok(attempted)
    }
}
