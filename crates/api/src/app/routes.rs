use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use listings_catalog::{Branch, ChangeEntry, ProductRecord};
use listings_sync::http::BATCH_ID_HEADER;
use listings_sync::{CatalogBackend, ChangeBatch, InMemoryBackend, SyncError};

use crate::app::errors;

pub async fn list_products(
    Extension(backend): Extension<Arc<InMemoryBackend>>,
) -> Json<Vec<ProductRecord>> {
    Json(backend.products())
}

pub async fn list_branches(
    Extension(backend): Extension<Arc<InMemoryBackend>>,
) -> Json<Vec<Branch>> {
    Json(backend.branches())
}

/// Apply a whole batch or none of it.
pub async fn process_queue(
    Extension(backend): Extension<Arc<InMemoryBackend>>,
    headers: HeaderMap,
    Json(entries): Json<Vec<ChangeEntry>>,
) -> axum::response::Response {
    let id = headers
        .get(BATCH_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v).ok())
        .unwrap_or_else(Uuid::now_v7);
    let batch = ChangeBatch { id, entries };

    match backend.submit_changes(&batch).await {
        Ok(()) => {
            tracing::info!(batch = %batch.id, entries = batch.entries.len(), "batch applied");
            (StatusCode::OK, Json(serde_json::json!({ "applied": batch.entries.len() }))).into_response()
        }
        Err(e) => {
            tracing::warn!(batch = %batch.id, error = %e, "batch rejected");
            errors::sync_error_to_response(e)
        }
    }
}

pub async fn new_branch(
    Extension(backend): Extension<Arc<InMemoryBackend>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let name = name.trim();
    if name.is_empty() {
        return errors::sync_error_to_response(SyncError::InvalidBranchName(name.to_string()));
    }

    match backend.create_branch(name).await {
        Ok(()) => {
            tracing::info!(branch = name, "branch created");
            StatusCode::CREATED.into_response()
        }
        Err(e) => errors::sync_error_to_response(e),
    }
}
