//! Error types for OpenAI client.

use thiserror::Error;

/// Result type for OpenAI client operations.
pub type Result<T> = std::result::Result<T, OpenAIError>;

/// OpenAI client errors.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, TLS, DNS)
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the client timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl OpenAIError {
    /// Upstream HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            OpenAIError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream payload for diagnostics. JSON bodies are returned as JSON,
    /// anything else is wrapped as `{"text": ...}`.
    pub fn detail(&self) -> serde_json::Value {
        match self {
            OpenAIError::Api { body, .. } => serde_json::from_str(body)
                .unwrap_or_else(|_| serde_json::json!({ "text": body })),
            other => serde_json::json!({ "text": other.to_string() }),
        }
    }
}
