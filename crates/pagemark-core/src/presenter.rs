//! Presentation hooks used by the viewer session.

use crate::annotation::PendingAnnotation;
use crate::error::ViewerError;

/// A destructive operation that needs the user's consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// Delete a single annotation, identified by its marker label.
    DeleteAnnotation { label: String },
    /// Delete every annotation on the current page.
    ClearAll { count: usize },
}

impl Confirmation {
    /// Question shown to the user.
    pub fn prompt(&self) -> String {
        match self {
            Confirmation::DeleteAnnotation { label } => format!("Delete {}?", label),
            Confirmation::ClearAll { count } => {
                format!("Delete all {} annotations on this page?", count)
            }
        }
    }
}

/// User-facing side of the viewer: dialogs and error display.
pub trait Presenter {
    /// Ask for a description of a pending capture. `None` discards the capture.
    fn request_description(&mut self, pending: &PendingAnnotation) -> Option<String>;

    /// Ask whether a destructive operation should go ahead.
    fn confirm(&mut self, confirmation: &Confirmation) -> bool;

    /// Show an error that did not stop the session.
    fn report_error(&mut self, error: &ViewerError);
}
