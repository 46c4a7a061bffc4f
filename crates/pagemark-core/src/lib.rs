//! PageMark Core Library
//!
//! Coordinate transforms, gesture classification and annotation state for
//! annotating rasterized document pages.

pub mod annotation;
pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod gesture;
pub mod overlay;
pub mod presenter;
pub mod session;
pub mod store;
pub mod transform;
pub mod viewport;

#[cfg(test)]
pub(crate) mod testing;

pub use annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationShape, PendingAnnotation};
pub use backend::{Backend, BackendError, BackendResult, MemoryBackend};
#[cfg(feature = "http")]
pub use backend::HttpBackend;
pub use config::{ConfigError, LogLevel, ViewerConfig};
pub use document::{DocumentId, DocumentInfo, PageContext, PageInfo};
pub use error::{ErrorCategory, ViewerError};
pub use gesture::{CLICK_THRESHOLD, Capture, GestureClassifier, GestureOutcome, MouseButton, PointerEvent};
pub use overlay::{Marker, MarkerGeometry, Overlay, OverlayRenderer};
pub use presenter::{Confirmation, Presenter};
pub use session::{PageLoadOutcome, ViewerSession};
pub use store::{AnnotationStore, PageKey};
pub use transform::CoordinateTransformer;
pub use viewport::{MAX_ZOOM, MIN_ZOOM, ViewportState};
