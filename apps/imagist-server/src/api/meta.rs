use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Meta",
    responses((status = 200, description = "Service is up", body = serde_json::Value))
)]
pub async fn healthz() -> impl IntoResponse {
    Json(json!({"ok": true}))
}
