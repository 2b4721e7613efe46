use axum::response::IntoResponse;
use axum::Json;
use utoipa::OpenApi;

use crate::openapi::ApiDoc;

pub async fn openapi_doc() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
