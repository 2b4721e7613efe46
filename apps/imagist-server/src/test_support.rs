use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use imagist_gateway::{EditOutcome, GatewayError, GatewayResult, ModelGateway};

use crate::{config::Config, media::MediaStore, router::build_router, AppState};

pub mod env {
    use once_cell::sync::Lazy;
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    /// Serialises process-environment mutation across tests and restores
    /// every touched variable on drop.
    pub struct EnvGuard {
        _lock: MutexGuard<'static, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    pub fn guard() -> EnvGuard {
        let lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        EnvGuard {
            _lock: lock,
            saved: Vec::new(),
        }
    }

    impl EnvGuard {
        fn remember(&mut self, key: &str) {
            if !self.saved.iter().any(|(k, _)| k == key) {
                self.saved.push((key.to_string(), std::env::var(key).ok()));
            }
        }

        pub fn set(&mut self, key: &str, value: &str) {
            self.remember(key);
            std::env::set_var(key, value);
        }

        pub fn remove(&mut self, key: &str) {
            self.remember(key);
            std::env::remove_var(key);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain(..) {
                match value {
                    Some(value) => std::env::set_var(&key, value),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

/// Scripted gateway double. Each call pops the next queued outcome; an
/// empty queue reports an exhausted mock instead of panicking inside the
/// handler.
#[derive(Default)]
pub struct MockGateway {
    generate: Mutex<VecDeque<Result<GatewayResult, GatewayError>>>,
    edit: Mutex<VecDeque<Result<EditOutcome, GatewayError>>>,
    chat: Mutex<VecDeque<Result<String, GatewayError>>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_generate(&self, outcome: Result<GatewayResult, GatewayError>) {
        self.generate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    pub fn push_edit(&self, outcome: Result<EditOutcome, GatewayError>) {
        self.edit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    pub fn push_chat(&self, outcome: Result<String, GatewayError>) {
        self.chat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }
}

fn exhausted<T>() -> Result<T, GatewayError> {
    Err(GatewayError::External("mock exhausted".into()))
}

#[async_trait::async_trait]
impl ModelGateway for MockGateway {
    async fn generate(&self, _prompt: &str) -> Result<GatewayResult, GatewayError> {
        self.generate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(exhausted)
    }

    async fn edit(&self, _prompt: &str, _source_image: &[u8]) -> Result<EditOutcome, GatewayError> {
        self.edit
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(exhausted)
    }

    async fn chat(&self, _prompt: &str, _image: &[u8]) -> Result<String, GatewayError> {
        self.chat
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(exhausted)
    }
}

pub fn test_config(dir: &Path) -> Config {
    Config {
        state_dir: dir.join("state"),
        static_dir: dir.join("ui"),
        api_key: "test-key".into(),
        image_model: "image-model".into(),
        text_model: "text-model".into(),
        gateway_base_url: imagist_gateway::DEFAULT_BASE_URL.into(),
        request_timeout: Duration::from_secs(5),
    }
}

pub fn build_state(dir: &Path, gateway: Arc<MockGateway>) -> AppState {
    AppState::builder(test_config(dir))
        .with_gateway(gateway)
        .build()
        .expect("app state")
}

/// Business routes only; static mounts are exercised at the bootstrap
/// layer, not here.
pub fn app(state: AppState) -> Router {
    build_router().with_state(state)
}

const BOUNDARY: &str = "imagist-test-boundary";

fn multipart_body(fields: &[(&str, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, bytes) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match filename {
            Some(filename) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
            ),
        }
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn run(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

pub async fn post_form(
    app: Router,
    path: &str,
    fields: &[(&str, Option<&str>, &[u8])],
) -> (StatusCode, Value) {
    let request = Request::post(path)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields)))
        .expect("request");
    run(app, request).await
}

pub async fn get(app: Router, path: &str) -> (StatusCode, Value) {
    let request = Request::get(path).body(Body::empty()).expect("request");
    run(app, request).await
}

/// Leftover staging files, by name.
pub fn temp_files(media: &MediaStore) -> Vec<String> {
    std::fs::read_dir(media.dir())
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| entry.file_name().into_string().ok())
                .filter(|name| name.starts_with("temp_"))
                .collect()
        })
        .unwrap_or_default()
}
