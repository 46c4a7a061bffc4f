//! Surface trait abstraction.

use crate::raster::PageRaster;
use kurbo::{Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to decode page image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid raster: {0}")]
    InvalidRaster(String),
    #[error("Failed to write image: {0}")]
    Encode(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// A 2D raster sink.
///
/// Coordinates are display pixels of the zoomed canvas; raster and overlay
/// share the same space.
pub trait Surface {
    /// Resize the drawable area.
    fn resize(&mut self, size: Size);

    /// Erase everything drawn so far.
    fn clear(&mut self);

    /// Draw `raster` scaled to fill `dest`.
    fn draw_image(&mut self, raster: &PageRaster, dest: Rect);

    fn fill_rect(&mut self, rect: Rect, color: Color);

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64);
}
