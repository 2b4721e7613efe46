use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::{history::EntryKind, responses, AppState};

#[utoipa::path(
    get,
    path = "/get-history",
    tag = "History",
    responses(
        (status = 200, description = "Stored images plus chat transcript", body = serde_json::Value),
        (status = 500, description = "Store scan failed")
    )
)]
pub async fn get_history(State(state): State<AppState>) -> Response {
    let images = match state.media().list().await {
        Ok(records) => records,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "media listing failed");
            return responses::internal("Error getting history");
        }
    };
    let entries = match state.history().list_all().await {
        Ok(entries) => entries,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "history listing failed");
            return responses::internal("Error getting history");
        }
    };

    let image_history: Vec<_> = images
        .iter()
        .map(|record| {
            json!({
                "url": record.url,
                "filename": record.filename,
                "timestamp": record.created_at,
            })
        })
        .collect();
    let chat_history: Vec<_> = entries
        .into_iter()
        .filter(|entry| entry.kind == EntryKind::Chat)
        .collect();

    Json(json!({
        "success": true,
        "image_history": image_history,
        "chat_history": chat_history,
    }))
    .into_response()
}

#[utoipa::path(
    get,
    path = "/get-full-history",
    tag = "History",
    responses(
        (status = 200, description = "Every recorded entry, newest first", body = serde_json::Value),
        (status = 500, description = "Store scan failed")
    )
)]
pub async fn get_full_history(State(state): State<AppState>) -> Response {
    match state.history().list_all().await {
        Ok(entries) => Json(json!({
            "success": true,
            "history": entries,
        }))
        .into_response(),
        Err(err) => {
            error!(target: "imagist::api", error = %err, "history listing failed");
            responses::internal("Error getting history")
        }
    }
}
