use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use listings_sync::SyncError;

pub fn sync_error_to_response(err: SyncError) -> axum::response::Response {
    match err {
        SyncError::Api(code, msg) => {
            let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_error(status, "rejected", msg)
        }
        SyncError::InvalidBranchName(name) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_branch_name", format!("{name:?}"))
        }
        SyncError::Listing(e) => json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_listing", e.to_string()),
        other => json_error(StatusCode::INTERNAL_SERVER_ERROR, "backend_error", other.to_string()),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
