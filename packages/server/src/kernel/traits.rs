// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no intake logic.
// What to ask the model, and what to do with the answer, lives in domains/intake.
//
// Naming convention: Base* for trait names (e.g., BaseCompletion, BaseRetrieval)

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{FinishReason, Message, OpenAIError, Usage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Completion Trait (Infrastructure - hosted chat model)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: FinishReason,
    pub usage: Option<Usage>,
}

impl Completion {
    pub fn stop(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finish_reason: FinishReason::Stop,
            usage: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion timed out after {0}s")]
    Timeout(u64),

    /// Non-success response or unusable payload from the completion service
    #[error("Completion service error: {message}")]
    Upstream {
        status: Option<u16>,
        detail: serde_json::Value,
        message: String,
    },
}

impl From<OpenAIError> for CompletionError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Timeout(secs) => CompletionError::Timeout(secs),
            other => CompletionError::Upstream {
                status: other.status(),
                detail: other.detail(),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait BaseCompletion: Send + Sync {
    /// Run one chat completion over the full message list.
    async fn complete(
        &self,
        messages: &[Message],
        params: CompletionParams,
    ) -> std::result::Result<Completion, CompletionError>;

    /// Short non-secret description for logs and diagnostics.
    fn describe(&self) -> String {
        "completion".to_string()
    }
}

// =============================================================================
// Retrieval Trait (Infrastructure - optional knowledge-base search)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    pub text: String,
    pub source: String,
    pub score: f64,
}

#[async_trait]
pub trait BaseRetrieval: Send + Sync {
    /// A handful of snippets relevant to `query`.
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>>;
}

// =============================================================================
// EMR Trait (Infrastructure - optional directory/schedule passthrough)
// =============================================================================

/// Filters forwarded to the EMR provider search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[async_trait]
pub trait BaseEmr: Send + Sync {
    /// Provider records from the EMR, or None when it can't be used.
    async fn providers(&self, query: &ProviderQuery) -> Option<Vec<serde_json::Value>>;

    /// Schedule rows from the EMR, or None when it can't be used.
    async fn schedule(&self, provider_id: Option<&str>) -> Option<Vec<serde_json::Value>>;
}
