use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde_json::{json, Value};
use tracing::warn;

use crate::{
    error::GatewayError,
    parts::{parse_parts, GatewayResult, Part},
    EditOutcome, ModelGateway,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Reported when the edit fallback call returns no usable text.
pub const FALLBACK_UNAVAILABLE: &str =
    "Sorry, image editing is currently unavailable. Please try again later.";

const UPSTREAM_DETAIL_LIMIT: usize = 512;

pub struct GeminiClientConfig {
    pub api_key: String,
    pub image_model: String,
    pub text_model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Client for the `generateContent` REST endpoint. One blocking boundary
/// per request; the configured timeout is the only cancellation this layer
/// enforces.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    image_model: String,
    text_model: String,
}

impl GeminiClient {
    pub fn new(cfg: GeminiClientConfig) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("imagist/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(3))
            .timeout(cfg.timeout)
            .build()
            .map_err(|err| GatewayError::External(err.to_string()))?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key,
            image_model: cfg.image_model,
            text_model: cfg.text_model,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        )
    }

    async fn generate_content(
        &self,
        model: &str,
        parts: Vec<Value>,
        modalities: &[&str],
    ) -> Result<Vec<Part>, GatewayError> {
        let body = request_body(parts, modalities);
        let resp = self
            .http
            .post(self.endpoint(model))
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::External(err.to_string()))?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|err| GatewayError::External(err.to_string()))?;
        if !status.is_success() {
            let detail: String = String::from_utf8_lossy(&bytes)
                .chars()
                .take(UPSTREAM_DETAIL_LIMIT)
                .collect();
            return Err(GatewayError::External(format!(
                "upstream status {}: {}",
                status.as_u16(),
                detail
            )));
        }
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|_| GatewayError::Malformed("body"))?;
        parse_parts(&value)
    }
}

fn request_body(parts: Vec<Value>, modalities: &[&str]) -> Value {
    json!({
        "contents": [{"parts": parts}],
        "generationConfig": {"responseModalities": modalities},
    })
}

fn text_part(text: &str) -> Value {
    json!({"text": text})
}

fn image_part(bytes: &[u8]) -> Value {
    json!({
        "inline_data": {
            "mime_type": "image/png",
            "data": BASE64_STD.encode(bytes),
        }
    })
}

#[async_trait::async_trait]
impl ModelGateway for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<GatewayResult, GatewayError> {
        let parts = self
            .generate_content(&self.image_model, vec![text_part(prompt)], &["TEXT", "IMAGE"])
            .await?;
        Ok(GatewayResult::from_parts(parts))
    }

    async fn edit(
        &self,
        prompt: &str,
        source_image: &[u8],
    ) -> Result<EditOutcome, GatewayError> {
        let primary = self
            .generate_content(
                &self.image_model,
                vec![text_part(prompt), image_part(source_image)],
                &["TEXT", "IMAGE"],
            )
            .await;
        let primary_err = match primary {
            Ok(parts) => return Ok(EditOutcome::Completed(GatewayResult::from_parts(parts))),
            Err(err) => err,
        };

        warn!(
            target: "imagist::gateway",
            error = %primary_err,
            "primary edit call failed; asking text model for an explanation"
        );
        let fallback_prompt = format!("I want to edit this image. {}", prompt);
        match self
            .generate_content(&self.text_model, vec![text_part(&fallback_prompt)], &["TEXT"])
            .await
        {
            Ok(parts) => {
                let text = GatewayResult::from_parts(parts).text;
                let message = if text.trim().is_empty() {
                    FALLBACK_UNAVAILABLE.to_string()
                } else {
                    text
                };
                Ok(EditOutcome::Refused { message })
            }
            Err(fallback_err) => {
                // Fallback failure is swallowed; the original edit failure
                // stays the reported outcome.
                warn!(
                    target: "imagist::gateway",
                    error = %fallback_err,
                    "edit fallback call also failed"
                );
                Err(primary_err)
            }
        }
    }

    async fn chat(&self, prompt: &str, image: &[u8]) -> Result<String, GatewayError> {
        let framed = format!("Based on this image, {}", prompt);
        let parts = self
            .generate_content(
                &self.text_model,
                vec![text_part(&framed), image_part(image)],
                &["TEXT"],
            )
            .await?;
        Ok(GatewayResult::from_parts(parts).text)
    }
}
