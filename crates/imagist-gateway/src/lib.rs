//! Gateway to the external generative-image API.
//!
//! Wraps the `generateContent` REST surface, normalizes its heterogeneous
//! response parts into a uniform [`GatewayResult`], and carries the single
//! documented fallback path for failed edit calls.

use async_trait::async_trait;

mod client;
mod error;
mod parts;

pub use client::{GeminiClient, GeminiClientConfig, DEFAULT_BASE_URL, FALLBACK_UNAVAILABLE};
pub use error::GatewayError;
pub use parts::{parse_parts, GatewayResult, ImagePayload, Part};

/// Outcome of an edit call. `Refused` is the documented single-fallback
/// path: the primary call failed and a text-only call to the secondary
/// model produced (or defaulted to) an explanation for the user.
pub enum EditOutcome {
    Completed(GatewayResult),
    Refused { message: String },
}

/// Object-safe seam over the external model service so callers can
/// substitute a test double.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// Request text + image modalities for a prompt. An absent image part
    /// is a soft condition (`image: None`), not an error.
    async fn generate(&self, prompt: &str) -> Result<GatewayResult, GatewayError>;

    /// Same contract as [`generate`](Self::generate) with the source image
    /// sent alongside the prompt, plus one best-effort fallback attempt.
    async fn edit(&self, prompt: &str, source_image: &[u8])
        -> Result<EditOutcome, GatewayError>;

    /// Prompt + image to the secondary model; concatenated text only.
    async fn chat(&self, prompt: &str, image: &[u8]) -> Result<String, GatewayError>;
}
