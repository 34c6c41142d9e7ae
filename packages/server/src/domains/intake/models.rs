use std::sync::Arc;

use openai_client::{FinishReason, Usage};
use serde::Serialize;
use serde_json::Value;

use crate::common::normalize_text;
use crate::data::{DataFiles, DirectorySnapshot, InstructionFiles};
use crate::domains::hints::Hints;
use crate::domains::providers::Provider;

/// Upper bound on what a caller may ask for as `max_output_tokens`.
pub const MAX_OUTPUT_TOKENS_CEILING: u32 = 16_384;

/// One inbound chat request, leniently read from the JSON body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatInput {
    /// Normalized and trimmed; may be empty, which the service rejects
    pub message: String,
    /// Raw history entries; normalized by the service
    pub history: Vec<Value>,
    pub max_output_tokens: Option<u32>,
}

impl ChatInput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: normalize_text(&message.into()),
            ..Default::default()
        }
    }

    pub fn with_history(mut self, history: Vec<Value>) -> Self {
        self.history = history;
        self
    }

    /// `message` may be a string or a number; `history` must be an array to
    /// count; `max_output_tokens` only counts when it is a finite, positive
    /// number.
    pub fn from_json(body: &Value) -> Self {
        let message = match body.get("message") {
            Some(Value::String(s)) => normalize_text(s),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        let history = body
            .get("history")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let max_output_tokens = body
            .get("max_output_tokens")
            .and_then(Value::as_f64)
            .filter(|n| n.is_finite() && *n > 0.0)
            .map(|n| n.min(MAX_OUTPUT_TOKENS_CEILING as f64) as u32);

        Self {
            message,
            history,
            max_output_tokens,
        }
    }
}

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    /// The completion service
    Model,
    /// Rendered straight from the schedule for an explicit times request
    SlotListing,
    /// No completion service is configured
    NotConfigured,
    /// The model returned nothing usable twice
    Fallback,
}

/// Result of one chat request, with everything the debug view reports.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: String,
    pub source: ReplySource,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
    pub nudged: bool,
    pub hints: Hints,
    pub matched_provider_ids: Vec<String>,
    pub relaxed: bool,
    pub history_len: usize,
    pub snapshot: Arc<DirectorySnapshot>,
}

#[derive(Debug, Serialize)]
pub struct FilesPresent {
    #[serde(flatten)]
    pub instructions: InstructionFiles,
    #[serde(flatten)]
    pub data: DataFiles,
}

#[derive(Debug, Serialize)]
pub struct ProviderCounts {
    pub providers: usize,
    pub slots: usize,
}

#[derive(Debug, Serialize)]
pub struct SanityChecks {
    pub az_cash_psychiatry_count: usize,
    pub az_cash_psychiatry_list: Vec<String>,
}

/// `?debug=1` response body.
#[derive(Debug, Serialize)]
pub struct DebugPayload {
    pub reply: String,
    pub source: ReplySource,
    pub finish_reason: Option<FinishReason>,
    pub usage: Option<Usage>,
    pub files_present: FilesPresent,
    pub provider_counts: ProviderCounts,
    pub directory_preview: Vec<String>,
    pub history_len: usize,
    pub hints: Hints,
    pub matched_provider_ids: Vec<String>,
    pub relaxed: bool,
    pub nudged: bool,
    pub sanity_checks: SanityChecks,
}

impl ChatOutcome {
    pub fn debug_payload(&self, instructions: InstructionFiles, preview_rows: usize) -> DebugPayload {
        let snapshot = &self.snapshot;

        let az_cash_psychiatry: Vec<String> = snapshot
            .providers
            .iter()
            .filter(|p| p.is_prescriber() && p.is_licensed_in("AZ") && p.accepts_cash())
            .map(|p| format!("{} {}", p.id, p.name))
            .collect();

        DebugPayload {
            reply: self.reply.clone(),
            source: self.source,
            finish_reason: self.finish_reason,
            usage: self.usage.clone(),
            files_present: FilesPresent {
                instructions,
                data: snapshot.files,
            },
            provider_counts: ProviderCounts {
                providers: snapshot.providers.len(),
                slots: snapshot.slots.len(),
            },
            directory_preview: snapshot
                .providers
                .iter()
                .take(preview_rows)
                .map(preview_row)
                .collect(),
            history_len: self.history_len,
            hints: self.hints.clone(),
            matched_provider_ids: self.matched_provider_ids.clone(),
            relaxed: self.relaxed,
            nudged: self.nudged,
            sanity_checks: SanityChecks {
                az_cash_psychiatry_count: az_cash_psychiatry.len(),
                az_cash_psychiatry_list: az_cash_psychiatry,
            },
        }
    }
}

/// "id | name | role | states | insurers | languages | email"
fn preview_row(p: &Provider) -> String {
    [
        p.id.clone(),
        p.name.clone(),
        p.role.to_string(),
        p.licensed_states.join(","),
        p.insurers.join(","),
        p.languages.join(","),
        p.email.clone().unwrap_or_default(),
    ]
    .join(" | ")
}
