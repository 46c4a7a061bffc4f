//! Annotation records and pending captures.

use crate::document::DocumentId;
use crate::gesture::Capture;
use crate::transform::CoordinateTransformer;
use chrono::{DateTime, Utc};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Unique identifier for a persisted annotation (assigned by the backend).
pub type AnnotationId = u64;

/// Kind of annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Point,
    Area,
}

impl AnnotationKind {
    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            AnnotationKind::Point => "Point",
            AnnotationKind::Area => "Area",
        }
    }

    /// 1-based marker label, e.g. `"Area 3"` for index 2.
    pub fn label(self, index: usize) -> String {
        format!("{} {}", self.name(), index + 1)
    }
}

/// Geometry of an annotation in document space.
///
/// Areas always store their top-left corner and a non-negative size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnnotationShape {
    Point { x: f64, y: f64 },
    Area { x: f64, y: f64, width: f64, height: f64 },
}

impl AnnotationShape {
    pub fn point(position: Point) -> Self {
        AnnotationShape::Point {
            x: position.x,
            y: position.y,
        }
    }

    /// Build an area from any rectangle, normalizing it first.
    pub fn area(rect: Rect) -> Self {
        let rect = rect.abs();
        AnnotationShape::Area {
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        match self {
            AnnotationShape::Point { .. } => AnnotationKind::Point,
            AnnotationShape::Area { .. } => AnnotationKind::Area,
        }
    }

    /// Position of the point, or top-left corner of the area.
    pub fn origin(&self) -> Point {
        match *self {
            AnnotationShape::Point { x, y } | AnnotationShape::Area { x, y, .. } => Point::new(x, y),
        }
    }

    /// Bounds in document space (zero-sized for points).
    pub fn bounds(&self) -> Rect {
        match *self {
            AnnotationShape::Point { x, y } => Rect::new(x, y, x, y),
            AnnotationShape::Area {
                x,
                y,
                width,
                height,
            } => Rect::new(x, y, x + width, y + height),
        }
    }

    /// All coordinates finite and area sizes non-negative.
    pub fn is_valid(&self) -> bool {
        match *self {
            AnnotationShape::Point { x, y } => x.is_finite() && y.is_finite(),
            AnnotationShape::Area {
                x,
                y,
                width,
                height,
            } => {
                [x, y, width, height].iter().all(|v| v.is_finite()) && width >= 0.0 && height >= 0.0
            }
        }
    }

    /// Coordinate text, e.g. `"X: 1.00, Y: 2.00"`.
    pub fn coordinates_text(&self) -> String {
        match *self {
            AnnotationShape::Point { x, y } => format!("X: {x:.2}, Y: {y:.2}"),
            AnnotationShape::Area {
                x,
                y,
                width,
                height,
            } => format!("X: {x:.2}, Y: {y:.2}, Width: {width:.2}, Height: {height:.2}"),
        }
    }
}

/// A persisted annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub document_id: DocumentId,
    pub page_number: u32,
    #[serde(flatten)]
    pub shape: AnnotationShape,
    /// `scale_factor * zoom` in effect when the annotation was captured.
    pub scale_factor_at_capture: f64,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        self.shape.kind()
    }

    /// Entry for an annotation list at position `index` (0-based).
    pub fn list_entry(&self, index: usize) -> AnnotationListEntry {
        AnnotationListEntry {
            id: self.id,
            kind: self.kind(),
            label: self.kind().label(index),
            coordinates: self.shape.coordinates_text(),
            description: (!self.description.is_empty()).then(|| self.description.clone()),
            created_at: self.created_at,
        }
    }
}

/// Request body for creating an annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub document_id: DocumentId,
    pub page_number: u32,
    #[serde(flatten)]
    pub shape: AnnotationShape,
    pub scale_factor_at_capture: f64,
    #[serde(default)]
    pub description: String,
}

/// A classified capture waiting for the user to describe or discard it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingAnnotation {
    /// Captured geometry in document space.
    pub shape: AnnotationShape,
    /// Display position of the point, or display top-left of the area.
    pub display_anchor: Point,
    /// `scale_factor * zoom` at capture time.
    pub effective_scale: f64,
}

impl PendingAnnotation {
    /// Convert a display-space capture. Returns `None` when no page is loaded.
    pub fn from_capture(capture: Capture, transformer: &CoordinateTransformer) -> Option<Self> {
        let effective_scale = transformer.effective_scale()?;
        let (shape, display_anchor) = match capture {
            Capture::Point(position) => (
                AnnotationShape::point(transformer.to_document(position)),
                position,
            ),
            Capture::Area(rect) => {
                let rect = rect.abs();
                (
                    AnnotationShape::area(transformer.rect_to_document(rect)),
                    rect.origin(),
                )
            }
        };
        Some(Self {
            shape,
            display_anchor,
            effective_scale,
        })
    }

    /// Summary shown while asking for a description.
    pub fn summary(&self) -> String {
        format!("{}: {}", self.shape.kind().name(), self.shape.coordinates_text())
    }

    /// Build the create request for this capture.
    pub fn to_request(
        &self,
        document_id: DocumentId,
        page_number: u32,
        description: &str,
    ) -> NewAnnotation {
        NewAnnotation {
            document_id,
            page_number,
            shape: self.shape,
            scale_factor_at_capture: self.effective_scale,
            description: description.trim().to_string(),
        }
    }
}

/// Presentation data for one row of an annotation list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationListEntry {
    pub id: AnnotationId,
    pub kind: AnnotationKind,
    pub label: String,
    pub coordinates: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}
