use anyhow::{Context, Result};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::data::ReloadMode;
use crate::domains::matching::ScoringWeights;

/// Which hosted chat model to talk to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionConfig {
    Azure {
        endpoint: String,
        deployment: String,
        api_key: String,
        api_version: String,
    },
    OpenAi {
        api_key: String,
        model: String,
    },
}

impl CompletionConfig {
    pub fn describe(&self) -> String {
        match self {
            CompletionConfig::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            } => format!("azure {} deployment={} api-version={}", endpoint, deployment, api_version),
            CompletionConfig::OpenAi { model, .. } => format!("openai model={}", model),
        }
    }
}

/// Optional knowledge-base search (Azure Cognitive Search)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub endpoint: String,
    pub index: String,
    pub api_key: String,
    pub semantic_config: Option<String>,
}

/// Optional EMR passthrough for the directory and schedule endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmrConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Chat pipeline knobs
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub history_window: usize,
    pub temperature: f32,
    /// Requested output budgets are raised to at least this
    pub max_tokens_floor: u32,
    pub providers_per_role: usize,
    pub slots_per_provider: usize,
    pub context_char_budget: usize,
    pub index_char_budget: usize,
    pub max_providers: usize,
    pub debug_preview_rows: usize,
    pub scoring: ScoringWeights,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            history_window: 24,
            temperature: 1.0,
            max_tokens_floor: 2048,
            providers_per_role: 4,
            slots_per_provider: 3,
            context_char_budget: 9000,
            index_char_budget: 4000,
            max_providers: 12,
            debug_preview_rows: 5,
            scoring: ScoringWeights::default(),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_dir: PathBuf,
    pub config_dir: PathBuf,
    pub providers_file: String,
    pub schedule_file: String,
    pub data_reload: ReloadMode,
    pub timezone: Tz,
    pub completion: Option<CompletionConfig>,
    pub completion_timeout: Duration,
    pub search: Option<SearchConfig>,
    pub emr: Option<EmrConfig>,
    /// Empty means any origin
    pub allowed_origins: Vec<String>,
    pub chat: ChatSettings,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let azure = match (
            get("AZURE_OPENAI_ENDPOINT"),
            get("AZURE_OPENAI_DEPLOYMENT"),
            get("AZURE_OPENAI_API_KEY"),
        ) {
            (Some(endpoint), Some(deployment), Some(api_key)) => Some(CompletionConfig::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment,
                api_key,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| "2024-08-01-preview".to_string()),
            }),
            _ => None,
        };
        let completion = azure.or_else(|| {
            get("OPENAI_API_KEY").map(|api_key| CompletionConfig::OpenAi {
                api_key,
                model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            })
        });

        let search = match (
            get("AZURE_SEARCH_ENDPOINT"),
            get("AZURE_SEARCH_INDEX"),
            get("AZURE_SEARCH_API_KEY"),
        ) {
            (Some(endpoint), Some(index), Some(api_key)) => Some(SearchConfig {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                index,
                api_key,
                semantic_config: get("AZURE_SEARCH_SEMANTIC_CONFIG"),
            }),
            _ => None,
        };

        let emr = get("EMR_BASE_URL").map(|base_url| EmrConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: get("EMR_API_KEY"),
        });

        Ok(Self {
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| "./_data".to_string())),
            config_dir: PathBuf::from(get("CONFIG_DIR").unwrap_or_else(|| "./_config".to_string())),
            providers_file: get("PROVIDERS_FILE").unwrap_or_else(|| "providers_100.txt".to_string()),
            schedule_file: get("SCHEDULE_FILE")
                .unwrap_or_else(|| "provider_schedule_14d.txt".to_string()),
            data_reload: get("DATA_RELOAD")
                .unwrap_or_else(|| "per_request".to_string())
                .parse()
                .context("DATA_RELOAD must be per_request or cached")?,
            timezone: get("REFERENCE_TIMEZONE")
                .unwrap_or_else(|| "America/Chicago".to_string())
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("{}", e))
                .context("REFERENCE_TIMEZONE must be an IANA timezone name")?,
            completion,
            completion_timeout: Duration::from_secs(
                get("COMPLETION_TIMEOUT_SECS")
                    .unwrap_or_else(|| "60".to_string())
                    .parse()
                    .context("COMPLETION_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            search,
            emr,
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|o| !o.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            chat: ChatSettings::default(),
        })
    }

    pub fn providers_path(&self) -> PathBuf {
        self.data_dir.join(&self.providers_file)
    }

    pub fn schedule_path(&self) -> PathBuf {
        self.data_dir.join(&self.schedule_file)
    }
}

/// First and last couple of characters of a secret, for startup logs.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}****{}", head, tail)
}
