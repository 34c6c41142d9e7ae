//! Pure OpenAI REST API client
//!
//! A clean, minimal chat-completion client with no domain-specific logic.
//! Talks to either the public OpenAI API or an Azure OpenAI deployment.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{OpenAIClient, ChatRequest, Message};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let response = client.chat_completion(
//!     ChatRequest::new("gpt-4o").message(Message::user("Hello!")),
//! ).await?;
//! println!("{} ({:?})", response.content, response.finish_reason);
//! ```
//!
//! # Azure deployments
//!
//! ```rust,ignore
//! let client = OpenAIClient::azure(
//!     "https://my-resource.openai.azure.com",
//!     "intake-gpt",
//!     "2024-08-01-preview",
//!     api_key,
//! );
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Where chat completion requests are sent and how they authenticate.
#[derive(Debug, Clone)]
enum Endpoint {
    /// `{base_url}/chat/completions` with `Authorization: Bearer`
    OpenAi { base_url: String },
    /// `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...`
    /// with an `api-key` header
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    endpoint: Endpoint,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            endpoint: Endpoint::OpenAi {
                base_url: "https://api.openai.com/v1".to_string(),
            },
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create a client bound to an Azure OpenAI deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            endpoint: Endpoint::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            },
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies, compatible gateways, etc.).
    /// Has no effect on Azure clients.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        if let Endpoint::OpenAi { base_url } = &mut self.endpoint {
            *base_url = url.into();
        }
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Whether this client targets an Azure deployment.
    pub fn is_azure(&self) -> bool {
        matches!(self.endpoint, Endpoint::Azure { .. })
    }

    /// Full URL for the chat completions call.
    pub fn chat_completions_url(&self) -> String {
        match &self.endpoint {
            Endpoint::OpenAi { base_url } => format!("{}/chat/completions", base_url),
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, deployment, api_version
            ),
        }
    }

    /// Chat completion.
    ///
    /// Send messages to the chat completion API and get a response.
    /// Non-2xx responses surface as [`OpenAIError::Api`] with the upstream
    /// status and raw body.
    pub async fn chat_completion(&self, request: ChatRequest) -> Result<ChatResponse> {
        let start = std::time::Instant::now();

        let builder = self
            .http_client
            .post(self.chat_completions_url())
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request);

        let builder = match self.endpoint {
            Endpoint::OpenAi { .. } => {
                builder.header("Authorization", format!("Bearer {}", self.api_key))
            }
            Endpoint::Azure { .. } => builder.header("api-key", &self.api_key),
        };

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "OpenAI request failed");
            if e.is_timeout() {
                OpenAIError::Timeout(self.timeout.as_secs())
            } else {
                OpenAIError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI API error");
            return Err(OpenAIError::Api {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                OpenAIError::Timeout(self.timeout.as_secs())
            } else {
                OpenAIError::Network(e.to_string())
            }
        })?;

        let chat_response = parse_chat_response(&body)?;

        debug!(
            model = request.model.as_deref().unwrap_or("deployment"),
            finish_reason = ?chat_response.finish_reason,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI chat completion"
        );

        Ok(chat_response)
    }
}

/// Decode a successful chat completion body.
fn parse_chat_response(body: &str) -> Result<ChatResponse> {
    let raw: types::ChatResponseRaw = serde_json::from_str(body).map_err(|e| {
        OpenAIError::Parse(format!(
            "{} (body: {})",
            e,
            truncate_to_char_boundary(body, 200)
        ))
    })?;

    let choice = raw
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| OpenAIError::Parse("No choices in response".into()))?;

    Ok(ChatResponse {
        content: choice
            .message
            .and_then(|m| m.content)
            .unwrap_or_default()
            .trim()
            .to_string(),
        finish_reason: FinishReason::from_api(choice.finish_reason.as_deref()),
        usage: raw.usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test").with_base_url("https://custom.api.com");

        assert_eq!(client.api_key, "sk-test");
        assert!(!client.is_azure());
        assert_eq!(
            client.chat_completions_url(),
            "https://custom.api.com/chat/completions"
        );
    }

    #[test]
    fn test_azure_url() {
        let client = OpenAIClient::azure(
            "https://intake.openai.azure.com/",
            "gpt4o-intake",
            "2024-08-01-preview",
            "key",
        );

        assert!(client.is_azure());
        assert_eq!(
            client.chat_completions_url(),
            "https://intake.openai.azure.com/openai/deployments/gpt4o-intake/chat/completions?api-version=2024-08-01-preview"
        );
    }

    #[test]
    fn test_base_url_ignored_for_azure() {
        let client = OpenAIClient::azure("https://a.example", "d", "v", "k")
            .with_base_url("https://elsewhere.example");
        assert!(client.chat_completions_url().starts_with("https://a.example/"));
    }

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{
            "choices": [{"message": {"content": "  Hi there  "}, "finish_reason": "length"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        }"#;
        let parsed = parse_chat_response(body).unwrap();

        assert_eq!(parsed.content, "Hi there");
        assert_eq!(parsed.finish_reason, FinishReason::Length);
        assert_eq!(parsed.usage.unwrap().total_tokens, 12);
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert!(matches!(
            parse_chat_response("<html>oops</html>"),
            Err(OpenAIError::Parse(_))
        ));
        assert!(matches!(
            parse_chat_response(r#"{"choices": []}"#),
            Err(OpenAIError::Parse(_))
        ));
    }
}
