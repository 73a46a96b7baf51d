use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
    Router,
};

use listings_sync::InMemoryBackend;

pub mod errors;
pub mod routes;

/// Build the HTTP router over a shared in-memory backend.
pub fn build_app(backend: Arc<InMemoryBackend>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(routes::list_products))
        .route("/branches", get(routes::list_branches))
        .route("/process_queue", post(routes::process_queue))
        .route("/new_branch/:name", post(routes::new_branch))
        .layer(Extension(backend))
}

async fn health() -> StatusCode {
    StatusCode::OK
}
