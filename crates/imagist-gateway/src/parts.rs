use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use serde_json::Value;

use crate::error::GatewayError;

/// One element of the model's heterogeneous response content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    Inline { mime_type: String, data: String },
}

/// Extract the parts of the first candidate from a `generateContent`
/// response body. Missing `candidates`/`content`/`parts` is a malformed
/// response; parts of an unknown shape are skipped.
pub fn parse_parts(response: &Value) -> Result<Vec<Part>, GatewayError> {
    let candidate = response
        .get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(GatewayError::Malformed("candidates"))?;
    let content = candidate
        .get("content")
        .filter(|v| !v.is_null())
        .ok_or(GatewayError::Malformed("content"))?;
    let raw_parts = content
        .get("parts")
        .and_then(|v| v.as_array())
        .filter(|arr| !arr.is_empty())
        .ok_or(GatewayError::Malformed("parts"))?;

    let mut parts = Vec::with_capacity(raw_parts.len());
    for part in raw_parts {
        if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
            parts.push(Part::Text(text.to_string()));
            continue;
        }
        // Responses use camelCase on the wire; some proxies echo the
        // snake_case request spelling. Accept both.
        let inline = part.get("inlineData").or_else(|| part.get("inline_data"));
        if let Some(inline) = inline {
            if let Some(data) = inline.get("data").and_then(|v| v.as_str()) {
                let mime_type = inline
                    .get("mimeType")
                    .or_else(|| inline.get("mime_type"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("image/png")
                    .to_string();
                parts.push(Part::Inline {
                    mime_type,
                    data: data.to_string(),
                });
            }
        }
    }
    Ok(parts)
}

/// Normalized binary payload: raw bytes for storage plus the base64 text
/// used for inline `data:` delivery.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub base64: String,
    pub mime_type: String,
}

impl ImagePayload {
    /// The upstream contract does not say whether an inline payload is raw
    /// bytes or base64 text wrapped in a byte container. Detect by strict
    /// decode-and-validate: on success the payload was already encoded text
    /// (decode it for storage, expose it verbatim for inline delivery);
    /// otherwise it is raw bytes (encode only for inline delivery).
    pub fn from_wire(mime_type: String, data: Vec<u8>) -> Self {
        let decoded = std::str::from_utf8(&data).ok().and_then(|text| {
            let trimmed = text.trim();
            BASE64_STD
                .decode(trimmed)
                .ok()
                .map(|bytes| (trimmed.to_string(), bytes))
        });
        match decoded {
            Some((text, bytes)) => Self {
                bytes,
                base64: text,
                mime_type,
            },
            None => {
                let encoded = BASE64_STD.encode(&data);
                Self {
                    bytes: data,
                    base64: encoded,
                    mime_type,
                }
            }
        }
    }
}

/// Uniform result of a model call: all text parts concatenated in response
/// order, and the first inline payload if any.
pub struct GatewayResult {
    pub text: String,
    pub image: Option<ImagePayload>,
}

impl GatewayResult {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        let mut text = String::new();
        let mut image = None;
        for part in parts {
            match part {
                Part::Text(t) => text.push_str(&t),
                Part::Inline { mime_type, data } => {
                    // First inline part wins; later ones are dropped.
                    if image.is_none() {
                        image = Some(ImagePayload::from_wire(mime_type, data.into_bytes()));
                    }
                }
            }
        }
        Self { text, image }
    }
}
