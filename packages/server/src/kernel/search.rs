use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BaseRetrieval, Snippet};
use crate::config::SearchConfig;

const API_VERSION: &str = "2023-11-01";
const TOP: usize = 3;

/// Azure Cognitive Search client for knowledge-base snippets
pub struct AzureSearchRetriever {
    config: SearchConfig,
    client: reqwest::Client,
}

/// Search request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    search: &'a str,
    top: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    semantic_configuration: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<serde_json::Map<String, Value>>,
}

impl AzureSearchRetriever {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    fn url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint, self.config.index, API_VERSION
        )
    }
}

#[async_trait]
impl BaseRetrieval for AzureSearchRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<Snippet>> {
        let semantic = self.config.semantic_config.as_deref();
        let request = SearchRequest {
            search: query,
            top: TOP,
            query_type: semantic.map(|_| "semantic"),
            semantic_configuration: semantic,
        };

        let response = self
            .client
            .post(self.url())
            .header("api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send search request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Search API error {}: {}", status, body);
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        Ok(parsed.value.iter().filter_map(to_snippet).take(TOP).collect())
    }
}

/// Index schemas differ; take the first text-like field present.
fn to_snippet(doc: &serde_json::Map<String, Value>) -> Option<Snippet> {
    let field = |names: &[&str]| {
        names
            .iter()
            .find_map(|n| doc.get(*n).and_then(Value::as_str))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let text = field(&["content", "chunk", "text"])?;
    Some(Snippet {
        text,
        source: field(&["title", "metadata_storage_name", "id"]).unwrap_or_default(),
        score: doc
            .get("@search.score")
            .and_then(Value::as_f64)
            .unwrap_or_default(),
    })
}
