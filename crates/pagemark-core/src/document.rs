//! Document and page raster metadata.

use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Unique identifier for a document.
pub type DocumentId = u64;

/// Document units per inch (PDF points).
pub const POINTS_PER_INCH: f64 = 72.0;
/// Raster resolution used when a page is rendered for annotation.
pub const DEFAULT_DPI: u32 = 150;

/// A registered document and the size of its pages in document units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub filename: String,
    pub page_count: u32,
    /// Page width in points.
    pub page_width: f64,
    /// Page height in points.
    pub page_height: f64,
}

impl DocumentInfo {
    pub fn contains_page(&self, page: u32) -> bool {
        (1..=self.page_count).contains(&page)
    }
}

/// Raster metadata for one rendered page, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub image_url: String,
    /// Raster width in pixels at zoom 1.
    pub image_width: u32,
    /// Raster height in pixels at zoom 1.
    pub image_height: u32,
    /// Image pixels per document unit.
    pub scale_factor: f64,
    pub dpi: u32,
}

impl PageInfo {
    /// Metadata for `page` of `document` rendered at `dpi`.
    pub fn rendered(document: &DocumentInfo, page: u32, dpi: u32) -> Self {
        let scale_factor = f64::from(dpi) / POINTS_PER_INCH;
        Self {
            image_url: format!("/pages/page_{}_{}_{}.png", document.id, page, dpi),
            image_width: (document.page_width * scale_factor).round() as u32,
            image_height: (document.page_height * scale_factor).round() as u32,
            scale_factor,
            dpi,
        }
    }
}

/// Snapshot of the page currently shown by a viewer.
///
/// Replaced wholesale whenever a different page finishes loading.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub page_number: u32,
    pub image_url: String,
    pub image_width: u32,
    pub image_height: u32,
    pub scale_factor: f64,
    pub dpi: u32,
}

impl PageContext {
    pub fn new(page_number: u32, info: PageInfo) -> Self {
        Self {
            page_number,
            image_url: info.image_url,
            image_width: info.image_width,
            image_height: info.image_height,
            scale_factor: info.scale_factor,
            dpi: info.dpi,
        }
    }

    /// Raster size at zoom 1.
    pub fn image_size(&self) -> Size {
        Size::new(f64::from(self.image_width), f64::from(self.image_height))
    }

    /// Canvas size at the given zoom.
    pub fn canvas_size(&self, zoom: f64) -> Size {
        self.image_size() * zoom
    }

    /// Calibration text, e.g. `"2.08 px/pt @ 150 dpi"`.
    pub fn calibration_summary(&self) -> String {
        format!("{:.2} px/pt @ {} dpi", self.scale_factor, self.dpi)
    }
}
