//! Server dependencies (using traits for testability)
//!
//! Every external capability is optional. A missing one degrades a feature
//! (canned reply, no snippets, local-file fallback) instead of failing startup.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{mask_secret, CompletionConfig, Config};
use crate::kernel::{
    AzureSearchRetriever, BaseCompletion, BaseEmr, BaseRetrieval, EmrClient, OpenAICompletion,
};

// =============================================================================
// ServerDeps
// =============================================================================

#[derive(Clone, Default)]
pub struct ServerDeps {
    pub completion: Option<Arc<dyn BaseCompletion>>,
    pub retrieval: Option<Arc<dyn BaseRetrieval>>,
    pub emr: Option<Arc<dyn BaseEmr>>,
}

impl ServerDeps {
    pub fn new(
        completion: Option<Arc<dyn BaseCompletion>>,
        retrieval: Option<Arc<dyn BaseRetrieval>>,
        emr: Option<Arc<dyn BaseEmr>>,
    ) -> Self {
        Self {
            completion,
            retrieval,
            emr,
        }
    }

    /// Build production clients for whatever the config enables.
    pub fn from_config(config: &Config) -> Result<Self> {
        let completion = config.completion.as_ref().map(|c| {
            info!(
                service = %c.describe(),
                api_key = %mask_secret(api_key(c)),
                timeout_secs = config.completion_timeout.as_secs(),
                "Completion service configured"
            );
            Arc::new(OpenAICompletion::from_config(c, config.completion_timeout))
                as Arc<dyn BaseCompletion>
        });
        if completion.is_none() {
            warn!("No completion service configured; chat will return a canned reply");
        }

        let retrieval = match &config.search {
            Some(search) => {
                info!(
                    index = %search.index,
                    semantic = search.semantic_config.is_some(),
                    api_key = %mask_secret(&search.api_key),
                    "Knowledge-base search configured"
                );
                Some(Arc::new(AzureSearchRetriever::new(search.clone())?) as Arc<dyn BaseRetrieval>)
            }
            None => None,
        };

        let emr = match &config.emr {
            Some(emr) => {
                info!(
                    base_url = %emr.base_url,
                    has_key = emr.api_key.is_some(),
                    "EMR passthrough configured"
                );
                Some(Arc::new(EmrClient::new(emr.clone())?) as Arc<dyn BaseEmr>)
            }
            None => None,
        };

        Ok(Self::new(completion, retrieval, emr))
    }
}

fn api_key(config: &CompletionConfig) -> &str {
    match config {
        CompletionConfig::Azure { api_key, .. } | CompletionConfig::OpenAi { api_key, .. } => api_key,
    }
}
