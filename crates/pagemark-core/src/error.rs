//! Viewer error taxonomy.

use crate::annotation::AnnotationId;
use crate::backend::BackendError;
use thiserror::Error;

/// How an error is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A page or annotation fetch failed.
    LoadFailure,
    /// A create or delete was rejected.
    MutationFailure,
    /// The request made no sense in the current state; nothing happened.
    Ignored,
}

/// Errors reported by viewer operations.
///
/// None of these are fatal: the session keeps its last good state.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Failed to load page {page}: {source}")]
    PageLoad {
        page: u32,
        #[source]
        source: BackendError,
    },
    #[error("Failed to load annotations for page {page}: {source}")]
    AnnotationLoad {
        page: u32,
        #[source]
        source: BackendError,
    },
    #[error("Failed to save annotation: {0}")]
    Create(#[source] BackendError),
    #[error("Failed to delete annotation {id}: {source}")]
    Delete {
        id: AnnotationId,
        #[source]
        source: BackendError,
    },
    #[error(
        "Failed to clear annotations: {failed} of {attempted} deletions failed{}",
        reload_note(.reload)
    )]
    ClearAll {
        failed: usize,
        attempted: usize,
        errors: Vec<(AnnotationId, BackendError)>,
        /// Set when the follow-up reload failed too; the cached set is stale.
        reload: Option<Box<ViewerError>>,
    },
    #[error("No page is loaded")]
    NoPage,
    #[error("No annotation is waiting for confirmation")]
    NoPending,
}

fn reload_note(reload: &Option<Box<ViewerError>>) -> String {
    match reload {
        Some(err) => format!("; {}", err),
        None => String::new(),
    }
}

impl ViewerError {
    /// A clear-all whose reload failed is a load failure: what is shown no
    /// longer matches the backend.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ViewerError::PageLoad { .. }
            | ViewerError::AnnotationLoad { .. }
            | ViewerError::ClearAll { reload: Some(_), .. } => ErrorCategory::LoadFailure,
            ViewerError::Create(_) | ViewerError::Delete { .. } | ViewerError::ClearAll { .. } => {
                ErrorCategory::MutationFailure
            }
            ViewerError::NoPage | ViewerError::NoPending => ErrorCategory::Ignored,
        }
    }
}
