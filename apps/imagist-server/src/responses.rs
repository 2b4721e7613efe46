use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Uniform error body; every non-success response carries this shape.
pub fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({"success": false, "message": message.into()})),
    )
        .into_response()
}

pub fn internal(message: impl Into<String>) -> Response {
    failure(StatusCode::INTERNAL_SERVER_ERROR, message)
}

pub fn not_found(message: impl Into<String>) -> Response {
    failure(StatusCode::NOT_FOUND, message)
}

pub fn unprocessable(message: impl Into<String>) -> Response {
    failure(StatusCode::UNPROCESSABLE_ENTITY, message)
}
