//! The chat request pipeline.
//!
//! validate -> normalize history -> load snapshot -> extract hints ->
//! (times request? answer from the schedule) -> match + render context ->
//! compose prompt -> complete -> (nudge once?) -> reply

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use openai_client::{FinishReason, Message};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::common::{normalize_history, ConversationTurn};
use crate::config::ChatSettings;
use crate::data::{DirectorySnapshot, InstructionFiles, Instructions, SnapshotStore};
use crate::domains::hints::{detect_slot_request, extract_hints, Hints};
use crate::domains::intake::context::{build_context, ContextOptions};
use crate::domains::intake::error::ChatError;
use crate::domains::intake::models::{ChatInput, ChatOutcome, ReplySource, MAX_OUTPUT_TOKENS_CEILING};
use crate::domains::intake::nudge::NudgePolicy;
use crate::domains::intake::prompt::{build_messages, compose_system_prompt};
use crate::domains::intake::slots_reply::{pagination_anchor, try_slot_reply};
use crate::domains::matching::MatchingEngine;
use crate::kernel::{BaseCompletion, BaseRetrieval, Completion, CompletionParams, Snippet};

pub const NOT_CONFIGURED_REPLY: &str = "Hello! (Model not configured yet.)";
pub const TOKEN_LIMIT_REPLY: &str = "(I hit a token limit — continue?)";
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't put a reply together just now. Could you \
rephrase that, or tell me what kind of support you're looking for?";

/// Most retrieved snippets passed on to the prompt.
const MAX_SNIPPETS: usize = 3;

#[derive(Clone, TypedBuilder)]
pub struct IntakeService {
    store: Arc<SnapshotStore>,
    #[builder(default)]
    instructions: Arc<Instructions>,
    #[builder(default, setter(strip_option))]
    completion: Option<Arc<dyn BaseCompletion>>,
    #[builder(default, setter(strip_option))]
    retrieval: Option<Arc<dyn BaseRetrieval>>,
    #[builder(default)]
    settings: ChatSettings,
    #[builder(default = chrono_tz::America::Chicago)]
    timezone: Tz,
    #[builder(default)]
    nudge: NudgePolicy,
    #[builder(default = Duration::from_secs(60))]
    completion_timeout: Duration,
}

impl IntakeService {
    pub fn completion_configured(&self) -> bool {
        self.completion.is_some()
    }

    pub fn instruction_files(&self) -> InstructionFiles {
        self.instructions.files()
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Wall-clock time in the reference timezone.
    pub fn now(&self) -> NaiveDateTime {
        Utc::now().with_timezone(&self.timezone).naive_local()
    }

    pub async fn handle(&self, input: ChatInput) -> Result<ChatOutcome, ChatError> {
        self.handle_at(input, self.now()).await
    }

    /// Run the pipeline with an explicit "now".
    pub async fn handle_at(&self, input: ChatInput, now: NaiveDateTime) -> Result<ChatOutcome, ChatError> {
        if input.message.is_empty() {
            return Err(ChatError::InvalidInput("message required".to_string()));
        }

        let history = normalize_history(&input.history, self.settings.history_window);
        let snapshot = self.store.load().await?;
        let hints = extract_hints(&input.message, &history);

        debug!(
            history_len = history.len(),
            state = ?hints.state,
            insurer = ?hints.insurer,
            role = ?hints.role_preference,
            language = ?hints.language,
            wants_list = hints.wants_list,
            "Extracted hints"
        );

        if let Some(listing) = try_slot_reply(
            &input.message,
            &history,
            &snapshot,
            &hints,
            now,
            self.settings.slots_per_provider,
        ) {
            info!(providers = ?listing.provider_ids, "Answered times request from schedule");
            return Ok(outcome(listing.text, ReplySource::SlotListing, &history, hints, snapshot)
                .with_matches(listing.provider_ids, false));
        }

        let engine = MatchingEngine::new(self.settings.scoring, self.settings.providers_per_role);
        let selection = engine.select(&snapshot.providers, &hints, &snapshot.schedule, now);
        let anchor = detect_slot_request(&input.message)
            .map_or(now, |request| pagination_anchor(request, &history, now));
        let context = build_context(
            &selection,
            &snapshot.schedule,
            anchor,
            now,
            &self.context_options(hints.wants_list),
        );
        let matched = selection.provider_ids();
        let relaxed = selection.relaxed;

        debug!(
            rendered = context.rendered_ids.len(),
            omitted = context.omitted,
            chars = context.char_len(),
            index_chars = context.index_char_len(),
            "Rendered provider context"
        );

        let Some(completion) = self.completion.as_deref() else {
            info!("No completion service configured; returning canned reply");
            return Ok(outcome(
                NOT_CONFIGURED_REPLY.to_string(),
                ReplySource::NotConfigured,
                &history,
                hints,
                snapshot,
            )
            .with_matches(matched, relaxed));
        };

        let snippets = self.retrieve(&input.message).await;
        let system = compose_system_prompt(
            &self.instructions,
            &snippets,
            &context.text,
            context.availability_index.as_deref(),
        );
        let messages = build_messages(system, &history, &input.message);
        let params = CompletionParams {
            temperature: self.settings.temperature,
            max_tokens: self.max_tokens(input.max_output_tokens),
        };

        // Hard upstream failures are reported, never nudged
        let first = self.complete(completion, &messages, params).await?;

        let (chosen, nudged) = match self.nudge.evaluate(&first, &history) {
            None => (first, false),
            Some(reason) => {
                info!(?reason, "Reply looked degenerate; nudging once");
                let mut retry = messages.clone();
                retry.push(Message::system(reason.instruction()));

                match self.complete(completion, &retry, params).await {
                    Ok(second) if second.text.trim().is_empty() && !first.text.trim().is_empty() => {
                        (first, true)
                    }
                    Ok(second) => (second, true),
                    Err(e) if !first.text.trim().is_empty() => {
                        warn!(error = %e, "Nudge retry failed; keeping first reply");
                        (first, true)
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let reply = apply_length_marker(&chosen.text, chosen.finish_reason);
        let (reply, source) = if reply.is_empty() {
            warn!("Completion returned no usable text; using fallback reply");
            (FALLBACK_REPLY.to_string(), ReplySource::Fallback)
        } else {
            (reply, ReplySource::Model)
        };

        let mut result = outcome(reply, source, &history, hints, snapshot).with_matches(matched, relaxed);
        result.finish_reason = Some(chosen.finish_reason);
        result.usage = chosen.usage;
        result.nudged = nudged;
        Ok(result)
    }

    fn context_options(&self, wants_list: bool) -> ContextOptions {
        ContextOptions::builder()
            .wants_list(wants_list)
            .slots_per_provider(self.settings.slots_per_provider)
            .char_budget(self.settings.context_char_budget)
            .max_providers(self.settings.max_providers)
            .index_char_budget(self.settings.index_char_budget)
            .build()
    }

    /// Requested budget, never below the configured floor.
    fn max_tokens(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(0)
            .max(self.settings.max_tokens_floor)
            .min(MAX_OUTPUT_TOKENS_CEILING)
    }

    async fn complete(
        &self,
        completion: &dyn BaseCompletion,
        messages: &[Message],
        params: CompletionParams,
    ) -> Result<Completion, ChatError> {
        let started = Instant::now();
        let result = tokio::time::timeout(self.completion_timeout, completion.complete(messages, params)).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Err(_) => {
                warn!(elapsed_ms, "Completion timed out");
                Err(ChatError::Timeout(self.completion_timeout.as_secs()))
            }
            Ok(Err(e)) => {
                warn!(elapsed_ms, error = %e, "Completion failed");
                Err(e.into())
            }
            Ok(Ok(done)) => {
                info!(
                    elapsed_ms,
                    finish_reason = ?done.finish_reason,
                    chars = done.text.len(),
                    "Completion finished"
                );
                Ok(done)
            }
        }
    }

    /// Retrieval is optional; failures are logged and skipped.
    async fn retrieve(&self, query: &str) -> Vec<Snippet> {
        let Some(retrieval) = &self.retrieval else {
            return Vec::new();
        };
        match retrieval.retrieve(query).await {
            Ok(snippets) => snippets.into_iter().take(MAX_SNIPPETS).collect(),
            Err(e) => {
                warn!(error = %e, "Retrieval failed; continuing without snippets");
                Vec::new()
            }
        }
    }
}

/// Truncated replies get a continuation marker, never an empty body.
pub fn apply_length_marker(text: &str, finish_reason: FinishReason) -> String {
    let text = text.trim();
    match finish_reason {
        FinishReason::Length if text.is_empty() => TOKEN_LIMIT_REPLY.to_string(),
        FinishReason::Length => format!("{} …", text),
        _ => text.to_string(),
    }
}

fn outcome(
    reply: String,
    source: ReplySource,
    history: &[ConversationTurn],
    hints: Hints,
    snapshot: Arc<DirectorySnapshot>,
) -> ChatOutcome {
    ChatOutcome {
        reply,
        source,
        finish_reason: None,
        usage: None,
        nudged: false,
        hints,
        matched_provider_ids: Vec::new(),
        relaxed: false,
        history_len: history.len(),
        snapshot,
    }
}

impl ChatOutcome {
    fn with_matches(mut self, ids: Vec<String>, relaxed: bool) -> Self {
        self.matched_provider_ids = ids;
        self.relaxed = relaxed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_marker() {
        assert_eq!(apply_length_marker("Here are", FinishReason::Length), "Here are …");
        assert_eq!(apply_length_marker("  ", FinishReason::Length), TOKEN_LIMIT_REPLY);
        assert_eq!(apply_length_marker(" done ", FinishReason::Stop), "done");
        assert_eq!(apply_length_marker("", FinishReason::Stop), "");
    }
}
