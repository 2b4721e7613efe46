use axum::{
    routing::{get, post},
    Router,
};

use crate::{api, AppState};

pub(crate) mod paths {
    pub const GENERATE_IMAGE: &str = "/generate-image";
    pub const EDIT_IMAGE: &str = "/edit-image";
    pub const CHAT_WITH_IMAGE: &str = "/chat-with-image";
    pub const GET_HISTORY: &str = "/get-history";
    pub const GET_FULL_HISTORY: &str = "/get-full-history";
    pub const HEALTHZ: &str = "/healthz";
    pub const OPENAPI: &str = "/spec/openapi.json";
}

pub(crate) fn build_router() -> Router<AppState> {
    Router::new()
        .route(paths::GENERATE_IMAGE, post(api::images::generate_image))
        .route(paths::EDIT_IMAGE, post(api::images::edit_image))
        .route(paths::CHAT_WITH_IMAGE, post(api::chat::chat_with_image))
        .route(paths::GET_HISTORY, get(api::history::get_history))
        .route(paths::GET_FULL_HISTORY, get(api::history::get_full_history))
        .route(paths::HEALTHZ, get(api::meta::healthz))
        .route(paths::OPENAPI, get(api::spec::openapi_doc))
}
