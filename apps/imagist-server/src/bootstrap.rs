use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tracing::info;

use crate::{access_log, config::Config, router::build_router, AppState};

/// Assemble the shared state and the full route table (business routes
/// plus read-only static mounts over the store directories).
pub(crate) async fn build(config: Config) -> anyhow::Result<(Router<()>, AppState)> {
    let state = AppState::builder(config).build()?;
    info!(
        media_dir = %state.config().media_dir().display(),
        history_dir = %state.config().history_dir().display(),
        "stores initialised"
    );
    let router = attach_static_mounts(build_router(), state.config());
    Ok((router.with_state(state.clone()), state))
}

fn attach_static_mounts(router: Router<AppState>, config: &Config) -> Router<AppState> {
    router
        .route_service("/", ServeFile::new(config.static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .nest_service("/images", ServeDir::new(config.media_dir()))
        .nest_service("/prompts", ServeDir::new(config.history_dir()))
}

pub(crate) fn attach_http_layers(router: Router<()>, concurrency_limit: usize) -> Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::{cors::CorsLayer, trace::TraceLayer};

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

pub(crate) fn attach_global_layers(router: Router<()>) -> Router<()> {
    router.layer(axum::middleware::from_fn(access_log::access_log_mw))
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum HttpConfigError {
    #[error("invalid IMAGIST_HTTP_MAX_CONC: {0}")]
    InvalidConcurrency(String),
    #[error("invalid IMAGIST_PORT: {0}")]
    InvalidPort(String),
    #[error("invalid IMAGIST_BIND: {0}")]
    InvalidBind(String),
}

#[derive(Debug)]
pub(crate) struct HttpConfig {
    pub addr: std::net::SocketAddr,
    pub concurrency_limit: usize,
}

pub(crate) fn http_config_from_env() -> Result<HttpConfig, HttpConfigError> {
    let concurrency_limit = std::env::var("IMAGIST_HTTP_MAX_CONC")
        .ok()
        .map(|raw| {
            raw.parse()
                .map_err(|_| HttpConfigError::InvalidConcurrency(raw))
        })
        .transpose()?
        .unwrap_or(1024);

    let bind = std::env::var("IMAGIST_BIND").unwrap_or_else(|_| "127.0.0.1".into());
    let port_raw = std::env::var("IMAGIST_PORT").unwrap_or_else(|_| "8000".into());
    let port: u16 = port_raw
        .parse()
        .map_err(|_| HttpConfigError::InvalidPort(port_raw))?;

    let addr = format!("{}:{}", bind, port)
        .parse()
        .map_err(|_| HttpConfigError::InvalidBind(bind))?;

    Ok(HttpConfig {
        addr,
        concurrency_limit,
    })
}
