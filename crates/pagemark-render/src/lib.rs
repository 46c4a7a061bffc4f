//! PageMark Render Library
//!
//! Draws page rasters and annotation overlays onto an abstract surface.

mod painter;
mod pixmap;
mod raster;
mod recording;
mod surface;

pub use painter::{OverlayPainter, OverlayStyle};
pub use pixmap::PixmapSurface;
pub use raster::PageRaster;
pub use recording::{DrawCommand, RecordingSurface};
pub use surface::{RenderError, RenderResult, Surface};
