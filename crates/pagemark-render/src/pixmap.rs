//! CPU surface backed by an RGBA image, used for PNG snapshots.

use crate::raster::PageRaster;
use crate::surface::{RenderError, RenderResult, Surface};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use kurbo::{Rect, Size};
use peniko::Color;
use std::path::Path;

/// Software surface. Rectangles are snapped to whole pixels.
#[derive(Debug, Clone)]
pub struct PixmapSurface {
    pixels: RgbaImage,
}

impl Default for PixmapSurface {
    fn default() -> Self {
        Self {
            pixels: RgbaImage::new(0, 0),
        }
    }
}

/// Source-over blend of one pixel.
fn blend(dst: &mut Rgba<u8>, src: [u8; 4]) {
    let alpha = f32::from(src[3]) / 255.0;
    for i in 0..3 {
        let mixed = f32::from(src[i]) * alpha + f32::from(dst.0[i]) * (1.0 - alpha);
        dst.0[i] = mixed.round() as u8;
    }
    let out_alpha = alpha + f32::from(dst.0[3]) / 255.0 * (1.0 - alpha);
    dst.0[3] = (out_alpha * 255.0).round() as u8;
}

impl PixmapSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Write the current frame as PNG.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| RenderError::Encode(format!("{}: {}", path.display(), e)))?;
        log::info!("Wrote snapshot to {}", path.display());
        Ok(())
    }

    /// Pixel bounds covered by `rect`, clipped to the surface.
    fn pixel_bounds(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        let rect = rect.abs().round();
        let x0 = rect.x0.max(0.0) as u32;
        let y0 = rect.y0.max(0.0) as u32;
        let x1 = (rect.x1.max(0.0) as u32).min(self.pixels.width());
        let y1 = (rect.y1.max(0.0) as u32).min(self.pixels.height());
        (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
    }

    fn blend_rect(&mut self, rect: Rect, rgba: [u8; 4]) {
        if let Some((x0, y0, x1, y1)) = self.pixel_bounds(rect) {
            for y in y0..y1 {
                for x in x0..x1 {
                    blend(self.pixels.get_pixel_mut(x, y), rgba);
                }
            }
        }
    }
}

impl Surface for PixmapSurface {
    fn resize(&mut self, size: Size) {
        let width = size.width.max(0.0).round() as u32;
        let height = size.height.max(0.0).round() as u32;
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
    }

    fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([255, 255, 255, 255]);
        }
    }

    fn draw_image(&mut self, raster: &PageRaster, dest: Rect) {
        let dest = dest.abs().round();
        let width = dest.width() as u32;
        let height = dest.height() as u32;
        if width == 0 || height == 0 {
            return;
        }
        let scaled = if (width, height) == (raster.width(), raster.height()) {
            raster.image().clone()
        } else {
            imageops::resize(raster.image(), width, height, FilterType::Nearest)
        };
        imageops::overlay(&mut self.pixels, &scaled, dest.x0 as i64, dest.y0 as i64);
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let c = color.to_rgba8();
        self.blend_rect(rect, [c.r, c.g, c.b, c.a]);
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        let c = color.to_rgba8();
        let rgba = [c.r, c.g, c.b, c.a];
        let rect = rect.abs();
        let half = width / 2.0;
        let outer = rect.inflate(half, half);
        let inner = rect.inflate(-half, -half);
        if inner.width() <= 0.0 || inner.height() <= 0.0 {
            self.blend_rect(outer, rgba);
            return;
        }
        // top, bottom, left, right bands
        self.blend_rect(Rect::new(outer.x0, outer.y0, outer.x1, inner.y0), rgba);
        self.blend_rect(Rect::new(outer.x0, inner.y1, outer.x1, outer.y1), rgba);
        self.blend_rect(Rect::new(outer.x0, inner.y0, inner.x0, inner.y1), rgba);
        self.blend_rect(Rect::new(inner.x1, inner.y0, outer.x1, inner.y1), rgba);
    }
}
