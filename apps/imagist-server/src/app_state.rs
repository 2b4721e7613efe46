use std::sync::Arc;

use imagist_gateway::{GeminiClient, GeminiClientConfig, ModelGateway};

use crate::{config::Config, history::HistoryStore, media::MediaStore};

/// Cheap-to-clone handle shared across request handlers. All mutable state
/// lives on the filesystem behind the stores.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    media: MediaStore,
    history: HistoryStore,
    gateway: Arc<dyn ModelGateway>,
}

impl AppState {
    pub fn builder(config: Config) -> AppStateBuilder {
        AppStateBuilder {
            config,
            gateway: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn media(&self) -> &MediaStore {
        &self.inner.media
    }

    pub fn history(&self) -> &HistoryStore {
        &self.inner.history
    }

    pub fn gateway(&self) -> &dyn ModelGateway {
        self.inner.gateway.as_ref()
    }
}

pub struct AppStateBuilder {
    config: Config,
    gateway: Option<Arc<dyn ModelGateway>>,
}

impl AppStateBuilder {
    /// Substitute the gateway; tests use this to avoid the network.
    pub fn with_gateway(mut self, gateway: Arc<dyn ModelGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn build(self) -> anyhow::Result<AppState> {
        let media = MediaStore::new(self.config.media_dir())?;
        let history = HistoryStore::new(self.config.history_dir())?;
        let gateway: Arc<dyn ModelGateway> = match self.gateway {
            Some(gateway) => gateway,
            None => Arc::new(GeminiClient::new(GeminiClientConfig {
                api_key: self.config.api_key.clone(),
                image_model: self.config.image_model.clone(),
                text_model: self.config.text_model.clone(),
                base_url: self.config.gateway_base_url.clone(),
                timeout: self.config.request_timeout,
            })?),
        };
        Ok(AppState {
            inner: Arc::new(Inner {
                config: self.config,
                media,
                history,
                gateway,
            }),
        })
    }
}
