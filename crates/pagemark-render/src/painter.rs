//! Applies overlay geometry to a surface.

use crate::raster::PageRaster;
use crate::surface::Surface;
use kurbo::{Point, Rect, Size};
use pagemark_core::overlay::{MarkerGeometry, Overlay};
use peniko::Color;

/// Colors and sizes used for overlay markers.
#[derive(Debug, Clone, Copy)]
pub struct OverlayStyle {
    pub area_color: Color,
    pub point_color: Color,
    /// Live, unconfirmed selection.
    pub selection_color: Color,
    pub stroke_alpha: f32,
    pub fill_alpha: f32,
    pub stroke_width: f64,
    /// Edge length of the square drawn for a point.
    pub point_size: f64,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            area_color: Color::from_rgba8(0, 200, 0, 255),
            point_color: Color::from_rgba8(0, 0, 255, 255),
            selection_color: Color::from_rgba8(255, 0, 0, 255),
            stroke_alpha: 0.8,
            fill_alpha: 0.1,
            stroke_width: 2.0,
            point_size: 10.0,
        }
    }
}

impl OverlayStyle {
    fn stroke(&self, color: Color) -> Color {
        color.with_alpha(self.stroke_alpha)
    }

    fn fill(&self, color: Color) -> Color {
        color.with_alpha(self.fill_alpha)
    }

    fn point_rect(&self, center: Point) -> Rect {
        Rect::from_center_size(center, Size::new(self.point_size, self.point_size))
    }
}

/// Draws a page and its overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayPainter {
    pub style: OverlayStyle,
}

impl OverlayPainter {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Redraw the whole canvas.
    ///
    /// The surface is resized and cleared first, so repeated calls with the
    /// same input draw the same thing. Areas go below points; the live
    /// selection is drawn last.
    pub fn paint<S: Surface + ?Sized>(&self, surface: &mut S, raster: Option<&PageRaster>, overlay: &Overlay) {
        let style = &self.style;
        surface.resize(overlay.canvas);
        surface.clear();

        if let Some(raster) = raster {
            surface.draw_image(raster, Rect::from_origin_size(Point::ORIGIN, overlay.canvas));
        }

        for marker in &overlay.markers {
            if let MarkerGeometry::Region(rect) = marker.geometry {
                surface.fill_rect(rect, style.fill(style.area_color));
                surface.stroke_rect(rect, style.stroke(style.area_color), style.stroke_width);
            }
        }

        for marker in &overlay.markers {
            if let MarkerGeometry::Anchor(center) = marker.geometry {
                let rect = style.point_rect(center);
                surface.fill_rect(rect, style.stroke(style.point_color));
                surface.stroke_rect(rect, style.stroke(style.point_color), style.stroke_width);
            }
        }

        if let Some(selection) = overlay.selection {
            surface.fill_rect(selection, style.fill(style.selection_color));
            surface.stroke_rect(selection, style.stroke(style.selection_color), style.stroke_width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawCommand, RecordingSurface};
    use pagemark_core::annotation::AnnotationKind;
    use pagemark_core::overlay::Marker;

    fn marker(kind: AnnotationKind, geometry: MarkerGeometry) -> Marker {
        Marker {
            annotation_id: 1,
            kind,
            label: kind.label(0),
            title: String::new(),
            geometry,
        }
    }

    fn overlay() -> Overlay {
        Overlay {
            canvas: Size::new(200.0, 100.0),
            markers: vec![
                marker(AnnotationKind::Point, MarkerGeometry::Anchor(Point::new(50.0, 50.0))),
                marker(
                    AnnotationKind::Area,
                    MarkerGeometry::Region(Rect::new(10.0, 10.0, 40.0, 30.0)),
                ),
            ],
            selection: Some(Rect::new(0.0, 0.0, 5.0, 5.0)),
        }
    }

    #[test]
    fn test_paint_order() {
        let mut surface = RecordingSurface::new();
        let raster = PageRaster::blank(100, 50);
        OverlayPainter::default().paint(&mut surface, Some(&raster), &overlay());

        let commands = surface.commands();
        assert_eq!(commands[0], DrawCommand::Resize(Size::new(200.0, 100.0)));
        assert_eq!(commands[1], DrawCommand::Clear);
        assert!(matches!(
            commands[2],
            DrawCommand::Image { dest, width: 100, height: 50 } if dest == Rect::new(0.0, 0.0, 200.0, 100.0)
        ));
        // area fill + stroke, then the point, then the selection
        assert!(matches!(commands[3], DrawCommand::Fill { rect, .. } if rect == Rect::new(10.0, 10.0, 40.0, 30.0)));
        assert!(matches!(commands[5], DrawCommand::Fill { rect, .. } if rect == Rect::new(45.0, 45.0, 55.0, 55.0)));
        assert!(matches!(commands[7], DrawCommand::Fill { rect, .. } if rect == Rect::new(0.0, 0.0, 5.0, 5.0)));
        assert_eq!(commands.len(), 9);
    }

    #[test]
    fn test_alpha_and_width() {
        let mut surface = RecordingSurface::new();
        OverlayPainter::default().paint(&mut surface, None, &overlay());

        match surface.commands()[2] {
            DrawCommand::Fill { rgba, .. } => assert_eq!(rgba, [0, 200, 0, 26]),
            ref other => panic!("unexpected {other:?}"),
        }
        match surface.commands()[3] {
            DrawCommand::Stroke { rgba, width, .. } => {
                assert_eq!(rgba, [0, 200, 0, 204]);
                assert_eq!(width, 2.0);
            }
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_paint_twice_is_identical() {
        let painter = OverlayPainter::default();
        let mut first = RecordingSurface::new();
        let mut second = RecordingSurface::new();
        painter.paint(&mut first, None, &overlay());
        painter.paint(&mut second, None, &overlay());
        painter.paint(&mut second, None, &overlay());
        assert_eq!(first.commands(), second.commands());
    }
}
