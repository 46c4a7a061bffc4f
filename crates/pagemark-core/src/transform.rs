//! Coordinate transforms between display, image and document space.

use kurbo::{Point, Rect};

/// Converts positions between the three coordinate spaces of a page.
///
/// - *display* space: pointer positions on the zoomed canvas.
/// - *image* space: pixels of the page raster at zoom 1.
/// - *document* space: canonical page units, independent of zoom and DPI.
///
/// The scale factor is the number of image pixels per document unit. Until a
/// page is loaded there is no scale factor and every conversion yields the
/// origin, so callers may query coordinates before a page is ready.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransformer {
    /// Image pixels per document unit (None when no page is loaded).
    scale_factor: Option<f64>,
    /// Display pixels per image pixel.
    zoom: f64,
}

impl CoordinateTransformer {
    /// Create a transformer for a loaded page.
    ///
    /// A non-positive or non-finite scale factor is treated as "no page".
    pub fn new(scale_factor: f64, zoom: f64) -> Self {
        let scale_factor = (scale_factor.is_finite() && scale_factor > 0.0).then_some(scale_factor);
        Self { scale_factor, zoom }
    }

    /// Create a transformer with no page loaded.
    pub fn unloaded(zoom: f64) -> Self {
        Self {
            scale_factor: None,
            zoom,
        }
    }

    /// Whether a page scale factor is available.
    pub fn is_loaded(&self) -> bool {
        self.scale_factor.is_some()
    }

    pub fn scale_factor(&self) -> Option<f64> {
        self.scale_factor
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Display pixels per document unit (`scale_factor * zoom`).
    pub fn effective_scale(&self) -> Option<f64> {
        self.scale_factor.map(|scale| scale * self.zoom)
    }

    /// Convert a display point to image space.
    pub fn display_to_image(&self, display: Point) -> Point {
        if !self.is_loaded() {
            return Point::ZERO;
        }
        Point::new(display.x / self.zoom, display.y / self.zoom)
    }

    /// Convert an image point to display space.
    pub fn image_to_display(&self, image: Point) -> Point {
        if !self.is_loaded() {
            return Point::ZERO;
        }
        Point::new(image.x * self.zoom, image.y * self.zoom)
    }

    /// Convert an image point to document space.
    pub fn image_to_document(&self, image: Point) -> Point {
        match self.scale_factor {
            Some(scale) => Point::new(image.x / scale, image.y / scale),
            None => Point::ZERO,
        }
    }

    /// Convert a document point to image space.
    pub fn document_to_image(&self, document: Point) -> Point {
        match self.scale_factor {
            Some(scale) => Point::new(document.x * scale, document.y * scale),
            None => Point::ZERO,
        }
    }

    /// Convert a display point to document space.
    pub fn to_document(&self, display: Point) -> Point {
        self.image_to_document(self.display_to_image(display))
    }

    /// Convert a document point to display space.
    pub fn to_display(&self, document: Point) -> Point {
        self.image_to_display(self.document_to_image(document))
    }

    /// Map a document-space rectangle to display space.
    pub fn rect_to_display(&self, document: Rect) -> Rect {
        Rect::from_points(
            self.to_display(Point::new(document.x0, document.y0)),
            self.to_display(Point::new(document.x1, document.y1)),
        )
    }

    /// Map a display-space rectangle to document space.
    pub fn rect_to_document(&self, display: Rect) -> Rect {
        Rect::from_points(
            self.to_document(Point::new(display.x0, display.y0)),
            self.to_document(Point::new(display.x1, display.y1)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point, eps: f64) {
        assert!(
            (a.x - b.x).abs() < eps && (a.y - b.y).abs() < eps,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_to_document_divides_by_zoom_then_scale() {
        let t = CoordinateTransformer::new(2.0, 1.5);
        let doc = t.to_document(Point::new(300.0, 150.0));
        assert_close(doc, Point::new(100.0, 50.0), 1e-12);
    }

    #[test]
    fn test_to_display_multiplies() {
        let t = CoordinateTransformer::new(150.0 / 72.0, 2.0);
        let display = t.to_display(Point::new(72.0, 36.0));
        assert_close(display, Point::new(300.0, 150.0), 1e-9);
    }

    #[test]
    fn test_roundtrip_across_zoom_and_scale() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(123.456, 789.012),
            Point::new(-40.0, 2500.5),
        ];
        for zoom in [0.25, 1.0, 3.0] {
            for scale in [0.5, 1.0, 2.0] {
                let t = CoordinateTransformer::new(scale, zoom);
                for p in points {
                    assert_close(t.to_display(t.to_document(p)), p, 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_image_space_is_intermediate() {
        let t = CoordinateTransformer::new(2.0, 0.5);
        let display = Point::new(50.0, 80.0);
        let image = t.display_to_image(display);
        assert_close(image, Point::new(100.0, 160.0), 1e-12);
        assert_close(t.image_to_document(image), t.to_document(display), 1e-12);
        assert_close(t.image_to_display(image), display, 1e-12);
    }

    #[test]
    fn test_unloaded_returns_origin() {
        let t = CoordinateTransformer::unloaded(2.0);
        assert!(!t.is_loaded());
        assert_eq!(t.to_document(Point::new(10.0, 20.0)), Point::ZERO);
        assert_eq!(t.to_display(Point::new(10.0, 20.0)), Point::ZERO);
        assert_eq!(t.effective_scale(), None);
    }

    #[test]
    fn test_invalid_scale_is_unloaded() {
        assert!(!CoordinateTransformer::new(0.0, 1.0).is_loaded());
        assert!(!CoordinateTransformer::new(-1.0, 1.0).is_loaded());
        assert!(!CoordinateTransformer::new(f64::NAN, 1.0).is_loaded());
    }

    #[test]
    fn test_effective_scale() {
        let t = CoordinateTransformer::new(2.0, 1.5);
        assert_eq!(t.effective_scale(), Some(3.0));
    }

    #[test]
    fn test_rect_to_display_normalizes() {
        let t = CoordinateTransformer::new(1.0, 2.0);
        let rect = t.rect_to_display(Rect::new(30.0, 40.0, 10.0, 20.0));
        assert_eq!(rect, Rect::new(20.0, 40.0, 60.0, 80.0));
    }
}
