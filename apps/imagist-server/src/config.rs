use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is not set; refusing to start")]
    MissingApiKey,
}

/// Resolved once at startup and handed to each component at construction.
/// Nothing reads directory paths from the environment after this point.
#[derive(Clone, Debug)]
pub struct Config {
    pub state_dir: PathBuf,
    pub static_dir: PathBuf,
    pub api_key: String,
    pub image_model: String,
    pub text_model: String,
    pub gateway_base_url: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            state_dir: PathBuf::from(env_string("IMAGIST_STATE_DIR", "state")),
            static_dir: PathBuf::from(env_string("IMAGIST_STATIC_DIR", "assets/ui")),
            api_key,
            image_model: env_string(
                "IMAGIST_IMAGE_MODEL",
                "gemini-2.0-flash-exp-image-generation",
            ),
            text_model: env_string("IMAGIST_TEXT_MODEL", "gemini-1.5-flash-latest"),
            gateway_base_url: env_string(
                "IMAGIST_GATEWAY_BASE_URL",
                imagist_gateway::DEFAULT_BASE_URL,
            ),
            request_timeout: Duration::from_secs(
                env_u64("IMAGIST_HTTP_TIMEOUT_SECS", 120).max(1),
            ),
        })
    }

    /// Flat directory of generated/uploaded image files.
    pub fn media_dir(&self) -> PathBuf {
        self.state_dir.join("media")
    }

    /// One JSON record per history entry.
    pub fn history_dir(&self) -> PathBuf {
        self.state_dir.join("prompts")
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}
