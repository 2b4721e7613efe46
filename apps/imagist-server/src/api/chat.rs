use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info};

use crate::{
    api::{images::record_history, read_form, text_field},
    history::{EntryKind, HistoryEntry},
    responses, AppState,
};

#[utoipa::path(
    post,
    path = "/chat-with-image",
    tag = "Chat",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Model reply about the image", body = serde_json::Value),
        (status = 404, description = "Referenced image does not exist"),
        (status = 422, description = "Missing prompt or image_url"),
        (status = 500, description = "Chat failed")
    )
)]
pub async fn chat_with_image(State(state): State<AppState>, multipart: Multipart) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let Some(prompt) = text_field(&fields, "prompt") else {
        return responses::unprocessable("prompt is required");
    };
    let Some(image_url) = text_field(&fields, "image_url") else {
        return responses::unprocessable("image_url is required");
    };

    // Accept either the serving URL or a bare filename.
    let filename = image_url.strip_prefix("/images/").unwrap_or(&image_url);
    let Some(path) = state.media().resolve(filename).await else {
        return responses::not_found("Image not found");
    };
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "failed to read stored image");
            return responses::internal("Error chatting about image");
        }
    };

    info!(target: "imagist::api", prompt = %prompt, image = %filename, "chatting about image");
    let reply = match state.gateway().chat(&prompt, &bytes).await {
        Ok(reply) => reply,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "chat call failed");
            return responses::internal("Error chatting about image");
        }
    };

    let mut entry = HistoryEntry::new(EntryKind::Chat, &prompt, &reply);
    entry.image_path = Some(image_url.clone());
    record_history(&state, &entry).await;

    Json(json!({
        "success": true,
        "message": reply,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::ImageKind;
    use crate::test_support::{self, MockGateway};
    use axum::http::StatusCode;
    use imagist_gateway::GatewayError;
    use tempfile::tempdir;

    #[tokio::test]
    async fn chat_replies_and_records_history() {
        let temp = tempdir().expect("tempdir");
        let gateway = MockGateway::new();
        gateway.push_chat(Ok("It is a red circle on white.".into()));
        let state = test_support::build_state(temp.path(), gateway);
        let stored = state
            .media()
            .save(b"circle-bytes", ImageKind::Generated)
            .await
            .expect("seed image");
        let app = test_support::app(state.clone());

        let (status, body) = test_support::post_form(
            app,
            "/chat-with-image",
            &[
                ("prompt", None, b"what is this?"),
                ("image_url", None, stored.url.as_bytes()),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "It is a red circle on white.");

        let entries = state.history().list_all().await.expect("history");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Chat);
        assert_eq!(entries[0].image_path.as_deref(), Some(stored.url.as_str()));
    }

    #[tokio::test]
    async fn chat_unknown_image_is_404() {
        let temp = tempdir().expect("tempdir");
        let state = test_support::build_state(temp.path(), MockGateway::new());
        let app = test_support::app(state);

        let (status, body) = test_support::post_form(
            app,
            "/chat-with-image",
            &[
                ("prompt", None, b"what is this?"),
                ("image_url", None, b"/images/missing.png"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Image not found");
    }

    #[tokio::test]
    async fn chat_traversal_in_image_url_is_404() {
        let temp = tempdir().expect("tempdir");
        let state = test_support::build_state(temp.path(), MockGateway::new());
        let app = test_support::app(state);

        let (status, _) = test_support::post_form(
            app,
            "/chat-with-image",
            &[
                ("prompt", None, b"what is this?"),
                ("image_url", None, b"/images/../secrets.txt"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_gateway_error_is_sanitized() {
        let temp = tempdir().expect("tempdir");
        let gateway = MockGateway::new();
        gateway.push_chat(Err(GatewayError::External("boom".into())));
        let state = test_support::build_state(temp.path(), gateway);
        let stored = state
            .media()
            .save(b"x", ImageKind::Generated)
            .await
            .expect("seed image");
        let app = test_support::app(state);

        let (status, body) = test_support::post_form(
            app,
            "/chat-with-image",
            &[
                ("prompt", None, b"hi"),
                ("image_url", None, stored.url.as_bytes()),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error chatting about image");
    }

    #[tokio::test]
    async fn chat_requires_both_fields() {
        let temp = tempdir().expect("tempdir");
        let state = test_support::build_state(temp.path(), MockGateway::new());
        let app = test_support::app(state);

        let (status, body) =
            test_support::post_form(app, "/chat-with-image", &[("prompt", None, b"hi")]).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "image_url is required");
    }
}
