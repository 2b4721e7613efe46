use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The model API call itself failed: network error, timeout, or a
    /// non-success upstream status.
    #[error("model request failed: {0}")]
    External(String),
    /// The response was well-formed HTTP but missing expected structure.
    #[error("model response missing {0}")]
    Malformed(&'static str),
}
