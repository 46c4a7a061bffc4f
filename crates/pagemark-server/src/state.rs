//! In-memory document and annotation registry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum::body::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use pagemark_core::annotation::{Annotation, AnnotationId, NewAnnotation};
use pagemark_core::backend::Reply;
use pagemark_core::document::{DocumentId, DocumentInfo, PageInfo};
use image::{ImageFormat, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::info;

/// Errors returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Reply::<()>::err(self.to_string()))).into_response()
    }
}

/// A document to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub filename: String,
    pub page_count: u32,
    /// Page width in points.
    pub page_width: f64,
    /// Page height in points.
    pub page_height: f64,
}

impl NewDocument {
    fn validate(&self) -> Result<(), ApiError> {
        let sized = |v: f64| v.is_finite() && v > 0.0;
        if self.page_count == 0 || !sized(self.page_width) || !sized(self.page_height) {
            return Err(ApiError::BadRequest(format!(
                "Invalid page geometry for {}",
                self.filename
            )));
        }
        Ok(())
    }
}

/// Parse a raster file name of the form `page_{document}_{page}_{dpi}.png`.
fn parse_raster_name(file: &str) -> Option<(DocumentId, u32, u32)> {
    let stem = file.strip_prefix("page_")?.strip_suffix(".png")?;
    let mut parts = stem.split('_');
    let document = parts.next()?.parse().ok()?;
    let page = parts.next()?.parse().ok()?;
    let dpi = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((document, page, dpi))
}

/// Placeholder page: white with a thin grey frame.
fn placeholder_png(width: u32, height: u32) -> Result<Vec<u8>, ApiError> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
            Rgb([200, 200, 200])
        } else {
            Rgb([255, 255, 255])
        }
    });
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| ApiError::Internal(format!("Failed to encode page raster: {}", e)))?;
    Ok(bytes)
}

/// Shared application state
pub struct AppState {
    documents: DashMap<DocumentId, DocumentInfo>,
    annotations: DashMap<AnnotationId, Annotation>,
    /// Encoded rasters by file name.
    rasters: DashMap<String, Bytes>,
    next_document_id: AtomicU64,
    next_annotation_id: AtomicU64,
    /// Resolution pages are rendered at.
    dpi: u32,
}

impl AppState {
    pub fn new(dpi: u32) -> Self {
        Self {
            documents: DashMap::new(),
            annotations: DashMap::new(),
            rasters: DashMap::new(),
            next_document_id: AtomicU64::new(1),
            next_annotation_id: AtomicU64::new(1),
            dpi: dpi.max(1),
        }
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    pub fn register_document(&self, document: NewDocument) -> Result<DocumentInfo, ApiError> {
        document.validate()?;
        let id = self.next_document_id.fetch_add(1, Ordering::SeqCst);
        let info = DocumentInfo {
            id,
            filename: document.filename,
            page_count: document.page_count,
            page_width: document.page_width,
            page_height: document.page_height,
        };
        info!("Registered document {} ({}, {} pages)", id, info.filename, info.page_count);
        self.documents.insert(id, info.clone());
        Ok(info)
    }

    /// Documents ordered by id.
    pub fn documents(&self) -> Vec<DocumentInfo> {
        let mut list: Vec<DocumentInfo> = self.documents.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|d| d.id);
        list
    }

    fn document(&self, id: DocumentId) -> Result<DocumentInfo, ApiError> {
        self.documents
            .get(&id)
            .map(|d| d.value().clone())
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))
    }

    /// Remove a document together with its annotations.
    pub fn delete_document(&self, id: DocumentId) -> Result<(), ApiError> {
        self.documents
            .remove(&id)
            .ok_or_else(|| ApiError::NotFound("Document not found".to_string()))?;
        self.annotations.retain(|_, a| a.document_id != id);
        let prefix = format!("page_{}_", id);
        self.rasters.retain(|name, _| !name.starts_with(&prefix));
        info!("Deleted document {}", id);
        Ok(())
    }

    pub fn page_info(&self, id: DocumentId, page: u32) -> Result<PageInfo, ApiError> {
        let document = self.document(id)?;
        if !document.contains_page(page) {
            return Err(ApiError::BadRequest("Invalid page number".to_string()));
        }
        Ok(PageInfo::rendered(&document, page, self.dpi))
    }

    /// PNG bytes for a raster file named by `PageInfo::image_url`.
    ///
    /// Pages are not rasterized from the document; a blank page of the
    /// advertised size stands in, rendered once and cached.
    pub fn page_image(&self, file: &str) -> Result<Bytes, ApiError> {
        let not_found = || ApiError::NotFound(format!("No page raster {}", file));
        let (id, page, dpi) = parse_raster_name(file).ok_or_else(not_found)?;
        if dpi != self.dpi {
            return Err(not_found());
        }
        let info = self.page_info(id, page).map_err(|_| not_found())?;
        if let Some(bytes) = self.rasters.get(file) {
            return Ok(bytes.value().clone());
        }
        let bytes = Bytes::from(placeholder_png(info.image_width, info.image_height)?);
        info!(
            "Rendered placeholder raster {} ({}x{})",
            file, info.image_width, info.image_height
        );
        self.rasters.insert(file.to_string(), bytes.clone());
        Ok(bytes)
    }

    /// Annotations of one page, newest first.
    pub fn annotations(&self, id: DocumentId, page: u32) -> Result<Vec<Annotation>, ApiError> {
        self.document(id)?;
        let mut list: Vec<Annotation> = self
            .annotations
            .iter()
            .filter(|e| e.document_id == id && e.page_number == page)
            .map(|e| e.value().clone())
            .collect();
        list.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(list)
    }

    pub fn create_annotation(&self, request: NewAnnotation) -> Result<Annotation, ApiError> {
        let document = self
            .document(request.document_id)
            .map_err(|_| ApiError::BadRequest("Unknown document".to_string()))?;
        if !document.contains_page(request.page_number) {
            return Err(ApiError::BadRequest("Invalid page number".to_string()));
        }
        if !request.shape.is_valid() {
            return Err(ApiError::BadRequest("Invalid annotation geometry".to_string()));
        }

        let annotation = Annotation {
            id: self.next_annotation_id.fetch_add(1, Ordering::SeqCst),
            document_id: request.document_id,
            page_number: request.page_number,
            shape: request.shape,
            scale_factor_at_capture: request.scale_factor_at_capture,
            description: request.description,
            created_at: Utc::now(),
        };
        info!(
            "Created {} annotation {} on document {} page {}",
            annotation.kind().name(),
            annotation.id,
            annotation.document_id,
            annotation.page_number
        );
        self.annotations.insert(annotation.id, annotation.clone());
        Ok(annotation)
    }

    pub fn delete_annotation(&self, id: AnnotationId) -> Result<(), ApiError> {
        self.annotations
            .remove(&id)
            .ok_or_else(|| ApiError::NotFound("Annotation not found".to_string()))?;
        info!("Deleted annotation {}", id);
        Ok(())
    }
}
