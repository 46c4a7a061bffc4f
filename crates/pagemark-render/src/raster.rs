//! Decoded page rasters.

use crate::surface::{RenderError, RenderResult};
use image::RgbaImage;
use kurbo::Size;

/// An RGBA page image at zoom 1.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRaster {
    image: RgbaImage,
}

impl PageRaster {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> RenderResult<Self> {
        let decoded = image::load_from_memory(bytes)?;
        let image = decoded.to_rgba8();
        log::debug!("Decoded page raster {}x{}", image.width(), image.height());
        Ok(Self { image })
    }

    /// Wrap raw RGBA8 pixels.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> RenderResult<Self> {
        let len = pixels.len();
        RgbaImage::from_raw(width, height, pixels)
            .map(|image| Self { image })
            .ok_or_else(|| {
                RenderError::InvalidRaster(format!(
                    "{} bytes do not make a {}x{} RGBA image",
                    len, width, height
                ))
            })
    }

    /// A white page of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> Size {
        Size::new(f64::from(self.width()), f64::from(self.height()))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}
