//! HTTP routes.

use crate::state::{ApiError, AppState, NewDocument};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use pagemark_core::annotation::{Annotation, AnnotationId, NewAnnotation};
use pagemark_core::backend::Reply;
use pagemark_core::document::{DocumentId, DocumentInfo, PageInfo};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

type SharedState = Arc<AppState>;

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/documents", get(list_documents).post(create_document))
        .route("/api/documents/{id}", delete(delete_document))
        .route("/api/documents/{id}/pages/{page}", get(page_info))
        .route("/api/documents/{id}/pages/{page}/annotations", get(list_annotations))
        .route("/api/annotations", post(create_annotation))
        .route("/api/annotations/{id}", delete(delete_annotation))
        .route("/pages/{file}", get(page_image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Index page
async fn index() -> &'static str {
    "PageMark backend - JSON API under /api"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn list_documents(State(state): State<SharedState>) -> Json<Reply<Vec<DocumentInfo>>> {
    Json(Reply::ok(state.documents()))
}

async fn create_document(
    State(state): State<SharedState>,
    Json(document): Json<NewDocument>,
) -> Result<(StatusCode, Json<Reply<DocumentInfo>>), ApiError> {
    let info = state.register_document(document)?;
    Ok((StatusCode::CREATED, Json(Reply::ok(info))))
}

async fn delete_document(
    State(state): State<SharedState>,
    Path(id): Path<DocumentId>,
) -> Result<Json<Reply<()>>, ApiError> {
    state.delete_document(id)?;
    Ok(Json(Reply::done()))
}

async fn page_info(
    State(state): State<SharedState>,
    Path((id, page)): Path<(DocumentId, u32)>,
) -> Result<Json<Reply<PageInfo>>, ApiError> {
    Ok(Json(Reply::ok(state.page_info(id, page)?)))
}

/// Raster advertised by `PageInfo::image_url`.
async fn page_image(
    State(state): State<SharedState>,
    Path(file): Path<String>,
) -> Result<([(header::HeaderName, &'static str); 1], Bytes), ApiError> {
    let bytes = state.page_image(&file)?;
    Ok(([(header::CONTENT_TYPE, "image/png")], bytes))
}

/// Bare array, newest first.
async fn list_annotations(
    State(state): State<SharedState>,
    Path((id, page)): Path<(DocumentId, u32)>,
) -> Result<Json<Vec<Annotation>>, ApiError> {
    Ok(Json(state.annotations(id, page)?))
}

async fn create_annotation(
    State(state): State<SharedState>,
    Json(request): Json<NewAnnotation>,
) -> Result<Json<Reply<Annotation>>, ApiError> {
    Ok(Json(Reply::ok(state.create_annotation(request)?)))
}

async fn delete_annotation(
    State(state): State<SharedState>,
    Path(id): Path<AnnotationId>,
) -> Result<Json<Reply<()>>, ApiError> {
    state.delete_annotation(id)?;
    Ok(Json(Reply::done()))
}
