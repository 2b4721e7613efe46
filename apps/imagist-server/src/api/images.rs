use axum::extract::{Multipart, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, info, warn};

use imagist_gateway::{EditOutcome, GatewayResult};

use crate::{
    api::{read_form, text_field},
    history::{EntryKind, HistoryEntry},
    media::{ImageKind, StoredImage},
    responses, AppState,
};

#[utoipa::path(
    post,
    path = "/generate-image",
    tag = "Images",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Image generated", body = serde_json::Value),
        (status = 422, description = "Missing prompt"),
        (status = 500, description = "Generation failed")
    )
)]
pub async fn generate_image(State(state): State<AppState>, multipart: Multipart) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let Some(prompt) = text_field(&fields, "prompt") else {
        return responses::unprocessable("prompt is required");
    };

    info!(target: "imagist::api", prompt = %prompt, "generating image");
    let result = match state.gateway().generate(&prompt).await {
        Ok(result) => result,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "generate call failed");
            return responses::internal("Error generating image");
        }
    };

    // A call can succeed and still carry no image part; soft failure.
    let Some(image) = result.image else {
        return responses::internal("No image was generated");
    };
    let stored = match state.media().save(&image.bytes, ImageKind::Generated).await {
        Ok(stored) => stored,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "failed to persist generated image");
            return responses::internal("Error generating image");
        }
    };

    let mut entry = HistoryEntry::new(EntryKind::Generate, &prompt, &result.text);
    entry.image_path = Some(stored.url.clone());
    record_history(&state, &entry).await;

    Json(json!({
        "success": true,
        "message": result.text,
        "image_url": stored.url,
        "data_url": format!("data:image/png;base64,{}", image.base64),
    }))
    .into_response()
}

#[utoipa::path(
    post,
    path = "/edit-image",
    tag = "Images",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Edit result (success or refused with explanation)", body = serde_json::Value),
        (status = 422, description = "Missing prompt or image"),
        (status = 500, description = "Edit failed")
    )
)]
pub async fn edit_image(State(state): State<AppState>, multipart: Multipart) -> Response {
    let fields = match read_form(multipart).await {
        Ok(fields) => fields,
        Err(resp) => return resp,
    };
    let Some(prompt) = text_field(&fields, "prompt") else {
        return responses::unprocessable("prompt is required");
    };
    let Some(upload) = fields.get("image").filter(|bytes| !bytes.is_empty()) else {
        return responses::unprocessable("image is required");
    };

    info!(target: "imagist::api", prompt = %prompt, bytes = upload.len(), "editing image");
    // Stage the upload, then keep a permanent copy for provenance.
    let temp = match state.media().save(upload, ImageKind::Temp).await {
        Ok(temp) => temp,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "failed to stage upload");
            return responses::internal("Error editing image");
        }
    };
    let input = match state.media().copy(&temp.filename, ImageKind::Input).await {
        Ok(input) => input,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "failed to keep input copy");
            state.media().delete(&temp.filename).await;
            return responses::internal("Error editing image");
        }
    };

    let response = run_edit(&state, &prompt, upload, &temp, &input).await;
    // The staging file must not outlive the request, whatever the outcome.
    state.media().delete(&temp.filename).await;
    response
}

async fn run_edit(
    state: &AppState,
    prompt: &str,
    upload: &[u8],
    temp: &StoredImage,
    input: &StoredImage,
) -> Response {
    match state.gateway().edit(prompt, upload).await {
        Ok(EditOutcome::Completed(result)) => {
            edit_completed(state, prompt, input, result).await
        }
        Ok(EditOutcome::Refused { message }) => {
            // Hand the user their original image back alongside the
            // model's explanation.
            match state.media().copy(&temp.filename, ImageKind::Error).await {
                Ok(copy) => Json(json!({
                    "success": false,
                    "message": format!("Error editing image: {message}"),
                    "image_url": copy.url,
                }))
                .into_response(),
                Err(err) => {
                    error!(target: "imagist::api", error = %err, "failed to keep refused-edit copy");
                    responses::internal("Error editing image")
                }
            }
        }
        Err(err) => {
            error!(target: "imagist::api", error = %err, "edit call failed");
            responses::internal("Error using AI to edit image")
        }
    }
}

async fn edit_completed(
    state: &AppState,
    prompt: &str,
    input: &StoredImage,
    result: GatewayResult,
) -> Response {
    let Some(image) = result.image else {
        return responses::internal("No image was generated from edit");
    };
    let stored = match state.media().save(&image.bytes, ImageKind::Generated).await {
        Ok(stored) => stored,
        Err(err) => {
            error!(target: "imagist::api", error = %err, "failed to persist edited image");
            return responses::internal("Error editing image");
        }
    };

    let mut entry = HistoryEntry::new(EntryKind::Edit, prompt, &result.text);
    entry.image_path = Some(stored.url.clone());
    entry.input_image_path = Some(input.url.clone());
    record_history(state, &entry).await;

    Json(json!({
        "success": true,
        "message": result.text,
        "image_url": stored.url,
        "data_url": format!("data:image/png;base64,{}", image.base64),
    }))
    .into_response()
}

pub(super) async fn record_history(state: &AppState, entry: &HistoryEntry) {
    if let Err(err) = state.history().append(entry).await {
        warn!(
            target: "imagist::api",
            error = %err,
            "failed to record history entry"
        );
    }
}
