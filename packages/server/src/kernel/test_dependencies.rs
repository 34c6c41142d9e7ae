// Mock implementations for testing
//
// Queued responses are replayed in order; every call is recorded so tests can
// assert on what the pipeline actually sent.

use anyhow::Result;
use async_trait::async_trait;
use openai_client::{FinishReason, Message};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    BaseCompletion, BaseEmr, BaseRetrieval, Completion, CompletionError, CompletionParams,
    ProviderQuery, Snippet,
};

// =============================================================================
// Mock Completion
// =============================================================================

/// Arguments captured from a complete call
#[derive(Debug, Clone)]
pub struct CompletionCall {
    pub messages: Vec<Message>,
    pub params: CompletionParams,
}

impl CompletionCall {
    pub fn system_prompt(&self) -> &str {
        self.messages
            .first()
            .filter(|m| m.role == "system")
            .map_or("", |m| m.content.as_str())
    }
}

pub struct MockCompletion {
    responses: Arc<Mutex<Vec<Result<Completion, CompletionError>>>>,
    calls: Arc<Mutex<Vec<CompletionCall>>>,
    delay: Option<Duration>,
}

impl MockCompletion {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Queue a reply that finished normally
    pub fn with_response(self, text: &str) -> Self {
        self.with_completion(Completion::stop(text))
    }

    pub fn with_finish(self, text: &str, finish_reason: FinishReason) -> Self {
        self.with_completion(Completion {
            text: text.to_string(),
            finish_reason,
            usage: None,
        })
    }

    pub fn with_completion(self, completion: Completion) -> Self {
        self.responses.lock().unwrap().push(Ok(completion));
        self
    }

    pub fn with_error(self, error: CompletionError) -> Self {
        self.responses.lock().unwrap().push(Err(error));
        self
    }

    /// Sleep before answering (for timeout tests)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<CompletionCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockCompletion {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseCompletion for MockCompletion {
    async fn complete(
        &self,
        messages: &[Message],
        params: CompletionParams,
    ) -> Result<Completion, CompletionError> {
        self.calls.lock().unwrap().push(CompletionCall {
            messages: messages.to_vec(),
            params,
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Completion::stop("Mock reply"))
        } else {
            responses.remove(0)
        }
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

// =============================================================================
// Mock Retrieval
// =============================================================================

pub struct MockRetrieval {
    snippets: Vec<Snippet>,
    fail: bool,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockRetrieval {
    pub fn new() -> Self {
        Self {
            snippets: Vec::new(),
            fail: false,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_snippet(mut self, text: &str, source: &str) -> Self {
        self.snippets.push(Snippet {
            text: text.to_string(),
            source: source.to_string(),
            score: 1.0,
        });
        self
    }

    /// Every retrieve call errors
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for MockRetrieval {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRetrieval for MockRetrieval {
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>> {
        self.queries.lock().unwrap().push(query.to_string());
        if self.fail {
            anyhow::bail!("search unavailable");
        }
        Ok(self.snippets.clone())
    }
}

// =============================================================================
// Mock EMR
// =============================================================================

/// Returns fixed payloads; `None` acts like an unreachable EMR.
#[derive(Default)]
pub struct MockEmr {
    providers: Option<Vec<Value>>,
    schedule: Option<Vec<Value>>,
    provider_queries: Arc<Mutex<Vec<ProviderQuery>>>,
}

impl MockEmr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_providers(mut self, items: Vec<Value>) -> Self {
        self.providers = Some(items);
        self
    }

    pub fn with_schedule(mut self, items: Vec<Value>) -> Self {
        self.schedule = Some(items);
        self
    }

    pub fn provider_queries(&self) -> Vec<ProviderQuery> {
        self.provider_queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl BaseEmr for MockEmr {
    async fn providers(&self, query: &ProviderQuery) -> Option<Vec<Value>> {
        self.provider_queries.lock().unwrap().push(query.clone());
        self.providers.clone()
    }

    async fn schedule(&self, provider_id: Option<&str>) -> Option<Vec<Value>> {
        let items = self.schedule.clone()?;
        Some(match provider_id {
            Some(id) => items.into_iter().filter(|i| i["id"] == id).collect(),
            None => items,
        })
    }
}
