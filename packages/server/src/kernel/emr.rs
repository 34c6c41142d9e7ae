use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::{BaseEmr, ProviderQuery};
use crate::config::EmrConfig;

/// Passthrough to an external EMR for the directory and schedule endpoints.
///
/// Any failure (no key, non-2xx, non-array body) yields `None` so callers fall
/// back to the local files.
pub struct EmrClient {
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EmrClient {
    pub fn new(config: EmrConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: config.base_url,
            api_key: config.api_key,
            client,
        })
    }

    async fn fetch_array(&self, path: &str, params: &[(&str, &str)]) -> Option<Vec<Value>> {
        let api_key = self.api_key.as_deref()?;
        let url = format!("{}/{}", self.base_url, path);

        let response = match self
            .client
            .get(&url)
            .bearer_auth(api_key)
            .query(params)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, path, "EMR request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(status = %response.status(), path, "EMR returned an error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(Value::Array(items)) => Some(items),
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, path, "EMR returned an unreadable body");
                None
            }
        }
    }
}

/// Non-empty filters only.
fn query_pairs(query: &ProviderQuery) -> Vec<(&'static str, &str)> {
    [
        ("insurance", query.insurance.as_deref()),
        ("specialty", query.specialty.as_deref()),
        ("location", query.location.as_deref()),
    ]
    .into_iter()
    .filter_map(|(k, v)| v.filter(|v| !v.is_empty()).map(|v| (k, v)))
    .collect()
}

#[async_trait]
impl BaseEmr for EmrClient {
    async fn providers(&self, query: &ProviderQuery) -> Option<Vec<Value>> {
        self.fetch_array("providers", &query_pairs(query)).await
    }

    async fn schedule(&self, provider_id: Option<&str>) -> Option<Vec<Value>> {
        let params: Vec<(&str, &str)> = provider_id
            .filter(|p| !p.is_empty())
            .map(|p| vec![("prov", p)])
            .unwrap_or_default();
        self.fetch_array("schedule", &params).await
    }
}
