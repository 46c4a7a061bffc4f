//! Overlay geometry: where markers go on the zoomed canvas.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, AnnotationShape};
use crate::transform::CoordinateTransformer;
use kurbo::{Point, Rect, Size};
use serde::Serialize;

/// Display-space geometry of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MarkerGeometry {
    /// A point marker centered on this position.
    Anchor(Point),
    /// A region outline.
    Region(Rect),
}

/// One confirmed annotation placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub annotation_id: AnnotationId,
    pub kind: AnnotationKind,
    /// Index-derived label, e.g. `"Area 2"`.
    pub label: String,
    /// Hover text with document coordinates.
    pub title: String,
    pub geometry: MarkerGeometry,
}

/// Complete overlay for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overlay {
    pub canvas: Size,
    pub markers: Vec<Marker>,
    /// Live, unconfirmed selection of an active drag.
    pub selection: Option<Rect>,
}

/// Hover text, e.g. `"Point 1: (10.00, 20.00)"` or `"Area 2: (1.00, 2.00) 3.00x4.00"`.
fn marker_title(label: &str, shape: &AnnotationShape) -> String {
    match *shape {
        AnnotationShape::Point { x, y } => format!("{label}: ({x:.2}, {y:.2})"),
        AnnotationShape::Area {
            x,
            y,
            width,
            height,
        } => format!("{label}: ({x:.2}, {y:.2}) {width:.2}x{height:.2}"),
    }
}

impl Overlay {
    /// Place every annotation on a canvas of the given size.
    ///
    /// Labels follow the order of `annotations`. Nothing is placed when no
    /// page is loaded.
    pub fn compute(
        annotations: &[Annotation],
        transformer: &CoordinateTransformer,
        canvas: Size,
        selection: Option<Rect>,
    ) -> Self {
        if !transformer.is_loaded() {
            return Self {
                canvas,
                markers: Vec::new(),
                selection: None,
            };
        }

        let markers = annotations
            .iter()
            .enumerate()
            .map(|(index, annotation)| {
                let kind = annotation.kind();
                let label = kind.label(index);
                let title = marker_title(&label, &annotation.shape);
                let geometry = match annotation.shape {
                    AnnotationShape::Point { x, y } => {
                        MarkerGeometry::Anchor(transformer.to_display(Point::new(x, y)))
                    }
                    AnnotationShape::Area { .. } => {
                        MarkerGeometry::Region(transformer.rect_to_display(annotation.shape.bounds()))
                    }
                };
                Marker {
                    annotation_id: annotation.id,
                    kind,
                    label,
                    title,
                    geometry,
                }
            })
            .collect();

        Self {
            canvas,
            markers,
            selection: selection.map(|rect| rect.abs()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.selection.is_none()
    }

    /// Markers of one kind, in label order.
    pub fn markers_of(&self, kind: AnnotationKind) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |m| m.kind == kind)
    }
}

/// Holds the overlay currently shown and replaces it on every redraw.
#[derive(Debug, Clone, Default)]
pub struct OverlayRenderer {
    current: Overlay,
    /// Number of redraws so far.
    revision: u64,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the overlay from scratch, discarding the previous markers.
    pub fn sync(
        &mut self,
        annotations: &[Annotation],
        transformer: &CoordinateTransformer,
        canvas: Size,
        selection: Option<Rect>,
    ) -> &Overlay {
        self.current = Overlay::compute(annotations, transformer, canvas, selection);
        self.revision += 1;
        &self.current
    }

    /// Replace only the live selection, keeping confirmed markers.
    pub fn set_selection(&mut self, selection: Option<Rect>) -> &Overlay {
        self.current.selection = selection.map(|rect| rect.abs());
        self.revision += 1;
        &self.current
    }

    pub fn current(&self) -> &Overlay {
        &self.current
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Remove every marker.
    pub fn clear(&mut self) {
        self.current = Overlay {
            canvas: self.current.canvas,
            ..Overlay::default()
        };
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn annotation(id: AnnotationId, shape: AnnotationShape) -> Annotation {
        Annotation {
            id,
            document_id: 1,
            page_number: 1,
            shape,
            scale_factor_at_capture: 1.0,
            description: String::new(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        }
    }

    fn sample() -> Vec<Annotation> {
        vec![
            annotation(3, AnnotationShape::Point { x: 10.0, y: 20.0 }),
            annotation(
                2,
                AnnotationShape::Area {
                    x: 5.0,
                    y: 5.0,
                    width: 10.0,
                    height: 20.0,
                },
            ),
            annotation(1, AnnotationShape::Point { x: 1.0, y: 1.0 }),
        ]
    }

    #[test]
    fn test_marker_placement() {
        let t = CoordinateTransformer::new(2.0, 1.5);
        let overlay = Overlay::compute(&sample(), &t, Size::new(300.0, 300.0), None);

        assert_eq!(overlay.markers.len(), 3);
        assert_eq!(
            overlay.markers[0].geometry,
            MarkerGeometry::Anchor(Point::new(30.0, 60.0))
        );
        assert_eq!(
            overlay.markers[1].geometry,
            MarkerGeometry::Region(Rect::new(15.0, 15.0, 45.0, 75.0))
        );
    }

    #[test]
    fn test_labels_follow_store_order() {
        let t = CoordinateTransformer::new(1.0, 1.0);
        let overlay = Overlay::compute(&sample(), &t, Size::ZERO, None);
        let labels: Vec<&str> = overlay.markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, ["Point 1", "Area 2", "Point 3"]);
        assert_eq!(overlay.markers[0].title, "Point 1: (10.00, 20.00)");
        assert_eq!(overlay.markers[1].title, "Area 2: (5.00, 5.00) 10.00x20.00");
        assert_eq!(overlay.markers_of(AnnotationKind::Point).count(), 2);
    }

    #[test]
    fn test_unloaded_page_has_no_markers() {
        let t = CoordinateTransformer::unloaded(1.0);
        let overlay = Overlay::compute(&sample(), &t, Size::ZERO, Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_selection_is_normalized() {
        let t = CoordinateTransformer::new(1.0, 1.0);
        let overlay = Overlay::compute(&[], &t, Size::ZERO, Some(Rect::new(150.0, 150.0, 50.0, 50.0)));
        assert_eq!(overlay.selection, Some(Rect::new(50.0, 50.0, 150.0, 150.0)));
    }

    #[test]
    fn test_sync_is_idempotent() {
        let t = CoordinateTransformer::new(2.0, 1.0);
        let annotations = sample();
        let mut renderer = OverlayRenderer::new();

        let first = renderer.sync(&annotations, &t, Size::new(100.0, 100.0), None).clone();
        let second = renderer.sync(&annotations, &t, Size::new(100.0, 100.0), None).clone();
        assert_eq!(first, second);
        assert_eq!(renderer.revision(), 2);
    }

    #[test]
    fn test_sync_replaces_markers() {
        let t = CoordinateTransformer::new(1.0, 1.0);
        let mut renderer = OverlayRenderer::new();
        renderer.sync(&sample(), &t, Size::ZERO, None);
        renderer.sync(&sample()[..1], &t, Size::ZERO, None);
        assert_eq!(renderer.current().markers.len(), 1);

        renderer.clear();
        assert!(renderer.current().is_empty());
    }
}
