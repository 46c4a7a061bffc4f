//! Surface that records draw calls instead of drawing.

use crate::raster::PageRaster;
use crate::surface::Surface;
use kurbo::{Rect, Size};
use peniko::Color;

/// One recorded draw call. Colors are stored as RGBA8.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Resize(Size),
    Clear,
    Image { dest: Rect, width: u32, height: u32 },
    Fill { rect: Rect, rgba: [u8; 4] },
    Stroke { rect: Rect, rgba: [u8; 4], width: f64 },
}

fn rgba8(color: Color) -> [u8; 4] {
    let c = color.to_rgba8();
    [c.r, c.g, c.b, c.a]
}

/// Keeps the draw calls of the current frame.
///
/// A resize starts a new frame, so the recording always holds exactly one
/// redraw.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    size: Size,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Number of fill calls in the current frame.
    pub fn fill_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Fill { .. }))
            .count()
    }
}

impl Surface for RecordingSurface {
    fn resize(&mut self, size: Size) {
        self.size = size;
        self.commands.clear();
        self.commands.push(DrawCommand::Resize(size));
    }

    fn clear(&mut self) {
        self.commands.retain(|c| matches!(c, DrawCommand::Resize(_)));
        self.commands.push(DrawCommand::Clear);
    }

    fn draw_image(&mut self, raster: &PageRaster, dest: Rect) {
        self.commands.push(DrawCommand::Image {
            dest,
            width: raster.width(),
            height: raster.height(),
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::Fill {
            rect,
            rgba: rgba8(color),
        });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.commands.push(DrawCommand::Stroke {
            rect,
            rgba: rgba8(color),
            width,
        });
    }
}
