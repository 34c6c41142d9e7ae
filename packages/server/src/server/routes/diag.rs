use axum::{extract::Extension, Json};
use serde::Serialize;

use crate::config::{CompletionConfig, Config};
use crate::data::{DataFiles, InstructionFiles, ReloadMode};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct CompletionStatus {
    pub configured: bool,
    /// "azure" or "openai"
    pub kind: Option<&'static str>,
    pub endpoint: bool,
    pub deployment: bool,
    pub api_version: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchStatus {
    pub configured: bool,
    pub index: Option<String>,
    pub semantic_config: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmrStatus {
    pub configured: bool,
    pub api_key: bool,
}

/// Which capabilities are configured. Never carries secrets.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub completion: CompletionStatus,
    pub search: SearchStatus,
    pub emr: EmrStatus,
    pub data_reload: ReloadMode,
    pub timezone: String,
}

impl Diagnostics {
    pub fn from_config(config: &Config) -> Self {
        let completion = match &config.completion {
            Some(CompletionConfig::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            }) => CompletionStatus {
                configured: true,
                kind: Some("azure"),
                endpoint: !endpoint.is_empty(),
                deployment: !deployment.is_empty(),
                api_version: Some(api_version.clone()),
                model: None,
            },
            Some(CompletionConfig::OpenAi { model, .. }) => CompletionStatus {
                configured: true,
                kind: Some("openai"),
                endpoint: true,
                deployment: false,
                api_version: None,
                model: Some(model.clone()),
            },
            None => CompletionStatus {
                configured: false,
                kind: None,
                endpoint: false,
                deployment: false,
                api_version: None,
                model: None,
            },
        };

        Self {
            completion,
            search: SearchStatus {
                configured: config.search.is_some(),
                index: config.search.as_ref().map(|s| s.index.clone()),
                semantic_config: config.search.as_ref().and_then(|s| s.semantic_config.clone()),
            },
            emr: EmrStatus {
                configured: config.emr.is_some(),
                api_key: config.emr.as_ref().is_some_and(|e| e.api_key.is_some()),
            },
            data_reload: config.data_reload,
            timezone: config.timezone.name().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiagResponse {
    #[serde(flatten)]
    pub diagnostics: Diagnostics,
    pub files: InstructionFiles,
    pub data_files: DataFiles,
}

/// `GET /api/diag`
pub async fn diag_handler(Extension(state): Extension<AppState>) -> Result<Json<DiagResponse>, ApiError> {
    let snapshot = state.intake.store().load().await?;

    Ok(Json(DiagResponse {
        diagnostics: (*state.diagnostics).clone(),
        files: state.intake.instruction_files(),
        data_files: snapshot.files,
    }))
}
