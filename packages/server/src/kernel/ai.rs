// Completion implementation using openai-client
//
// This is the infrastructure implementation of BaseCompletion.
// Business logic (what to put in the prompt) lives in domains/intake.

use std::time::Duration;

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};

use super::{BaseCompletion, Completion, CompletionError, CompletionParams};
use crate::config::CompletionConfig;

/// Hosted chat model, either an Azure deployment or the public OpenAI API
#[derive(Clone)]
pub struct OpenAICompletion {
    client: OpenAIClient,
    /// None for Azure, where the deployment fixes the model
    model: Option<String>,
    description: String,
}

impl OpenAICompletion {
    pub fn from_config(config: &CompletionConfig, timeout: Duration) -> Self {
        let (client, model) = match config {
            CompletionConfig::Azure {
                endpoint,
                deployment,
                api_key,
                api_version,
            } => (
                OpenAIClient::azure(endpoint, deployment, api_version, api_key),
                None,
            ),
            CompletionConfig::OpenAi { api_key, model } => {
                (OpenAIClient::new(api_key), Some(model.clone()))
            }
        };

        Self {
            client: client.with_timeout(timeout),
            model,
            description: config.describe(),
        }
    }

    fn request(&self, messages: &[Message], params: CompletionParams) -> ChatRequest {
        let request = match &self.model {
            Some(model) => ChatRequest::new(model),
            None => ChatRequest::default(),
        }
        .messages(messages.to_vec())
        .temperature(params.temperature);

        // Azure preview APIs and reasoning models only accept max_completion_tokens
        let newer = self
            .model
            .as_deref()
            .map_or(true, ChatRequest::uses_max_completion_tokens);
        if newer {
            request.max_completion_tokens(params.max_tokens)
        } else {
            request.max_tokens(params.max_tokens)
        }
    }
}

#[async_trait]
impl BaseCompletion for OpenAICompletion {
    async fn complete(
        &self,
        messages: &[Message],
        params: CompletionParams,
    ) -> Result<Completion, CompletionError> {
        let response = self
            .client
            .chat_completion(self.request(messages, params))
            .await?;

        Ok(Completion {
            text: response.content,
            finish_reason: response.finish_reason,
            usage: response.usage,
        })
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> CompletionParams {
        CompletionParams {
            temperature: 1.0,
            max_tokens: 2048,
        }
    }

    #[test]
    fn test_azure_request_uses_max_completion_tokens() {
        let completion = OpenAICompletion::from_config(
            &CompletionConfig::Azure {
                endpoint: "https://x.openai.azure.com".into(),
                deployment: "intake".into(),
                api_key: "key".into(),
                api_version: "2024-08-01-preview".into(),
            },
            Duration::from_secs(5),
        );
        let request = completion.request(&[Message::user("hi")], params());

        assert_eq!(request.model, None);
        assert_eq!(request.max_completion_tokens, Some(2048));
        assert_eq!(request.max_tokens, None);
        assert!(completion.describe().contains("deployment=intake"));
        assert!(!completion.describe().contains("key"));
    }

    #[test]
    fn test_openai_request_picks_token_field_by_model() {
        let config = |model: &str| CompletionConfig::OpenAi {
            api_key: "sk".into(),
            model: model.into(),
        };

        let older = OpenAICompletion::from_config(&config("gpt-4o"), Duration::from_secs(5))
            .request(&[Message::user("hi")], params());
        assert_eq!(older.model.as_deref(), Some("gpt-4o"));
        assert_eq!(older.max_tokens, Some(2048));

        let newer = OpenAICompletion::from_config(&config("gpt-5-mini"), Duration::from_secs(5))
            .request(&[Message::user("hi")], params());
        assert_eq!(newer.max_completion_tokens, Some(2048));
    }
}
