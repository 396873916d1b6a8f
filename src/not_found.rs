use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Fallback handler for unknown routes.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

pub fn get_404_not_found_response() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not Found"}))).into_response()
}
