use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imagist",
        description = "HTTP facade over a generative image model with on-disk media and prompt history."
    ),
    paths(
        crate::api::images::generate_image,
        crate::api::images::edit_image,
        crate::api::chat::chat_with_image,
        crate::api::history::get_history,
        crate::api::history::get_full_history,
        crate::api::meta::healthz,
    ),
    components(schemas(
        crate::history::HistoryEntry,
        crate::history::EntryKind,
        crate::media::MediaRecord,
    )),
    tags(
        (name = "Images", description = "Generation and editing"),
        (name = "Chat", description = "Conversation grounded in a stored image"),
        (name = "History", description = "Media and prompt history listings"),
        (name = "Meta", description = "Service liveness")
    )
)]
pub struct ApiDoc;
