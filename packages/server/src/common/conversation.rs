//! Conversation turns as supplied by the chat client.

use serde::{Deserialize, Serialize};

use crate::common::text::normalize_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// One prior message in the conversation window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == TurnRole::User
    }
}

/// Coerce loosely-typed history entries from the client.
///
/// Unrecognized roles become `user`, entries whose content is missing or blank
/// are dropped, and only the last `window` entries are kept.
pub fn normalize_history(entries: &[serde_json::Value], window: usize) -> Vec<ConversationTurn> {
    let start = entries.len().saturating_sub(window);

    entries[start..]
        .iter()
        .filter_map(|entry| {
            let role = match entry.get("role").and_then(|r| r.as_str()) {
                Some("assistant") => TurnRole::Assistant,
                _ => TurnRole::User,
            };
            let content = match entry.get("content") {
                Some(serde_json::Value::String(s)) => normalize_text(s),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                Some(serde_json::Value::Bool(b)) => b.to_string(),
                _ => String::new(),
            };
            if content.is_empty() {
                None
            } else {
                Some(ConversationTurn { role, content })
            }
        })
        .collect()
}

/// The most recent assistant turn, if any.
pub fn last_assistant_turn(history: &[ConversationTurn]) -> Option<&ConversationTurn> {
    history.iter().rev().find(|t| t.role == TurnRole::Assistant)
}
