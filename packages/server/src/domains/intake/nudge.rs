//! When to re-ask the model once after a degenerate first reply.
//!
//! The trigger is a tunable heuristic: an empty or filtered reply, or an
//! opener / open-ended question after the assistant has already asked
//! several questions in a row.

use lazy_static::lazy_static;
use openai_client::FinishReason;
use regex::Regex;
use serde::Serialize;

use crate::common::ConversationTurn;
use crate::kernel::Completion;

lazy_static! {
    static ref OPENER: Regex = Regex::new(
        r"(?i)^\W*(hi|hello|hey|welcome|thanks?( you)? for (reaching out|sharing)|how (can|may) i help|what brings you|tell me (a (little|bit) )?more|could you (tell|share)|can you (tell|share)|i'?d (love|like) to (learn|know|hear) more)\b"
    )
    .unwrap();
    static ref CHECKLIST: Regex = Regex::new(r"(?m)^\s*(- \[ \]|\d+\.|[-*] )").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeReason {
    Empty,
    ContentFilter,
    Stalled,
}

impl NudgeReason {
    /// Extra system instruction sent with the retry.
    pub fn instruction(&self) -> &'static str {
        match self {
            NudgeReason::Empty | NudgeReason::ContentFilter => {
                "Your previous reply was empty. Answer the user's last message directly and \
                 briefly, using only the information above."
            }
            NudgeReason::Stalled => {
                "You have already asked enough clarifying questions. Using only the matched \
                 providers above, present the best options now with their next openings, then \
                 ask at most one short follow-up question."
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NudgePolicy {
    pub enabled: bool,
    /// Questions the assistant must already have asked before an opener
    /// counts as stalling
    pub min_prior_questions: usize,
}

impl Default for NudgePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_prior_questions: 2,
        }
    }
}

impl NudgePolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn evaluate(&self, completion: &Completion, history: &[ConversationTurn]) -> Option<NudgeReason> {
        if !self.enabled {
            return None;
        }
        if completion.finish_reason == FinishReason::ContentFilter {
            return Some(NudgeReason::ContentFilter);
        }

        let reply = completion.text.trim();
        if reply.is_empty() {
            // A truncated empty reply gets the token-limit marker instead
            return (completion.finish_reason != FinishReason::Length).then_some(NudgeReason::Empty);
        }

        let asked = trailing_assistant_questions(history);
        (asked >= self.min_prior_questions && is_non_progressing(reply)).then_some(NudgeReason::Stalled)
    }
}

/// A greeting/opener, or a bare open question with no options in it.
pub fn is_non_progressing(reply: &str) -> bool {
    if CHECKLIST.is_match(reply) {
        return false;
    }
    OPENER.is_match(reply) || (reply.ends_with('?') && reply.chars().count() < 200)
}

/// Assistant turns ending in a question, counted back from the latest
/// assistant turn until one that doesn't.
fn trailing_assistant_questions(history: &[ConversationTurn]) -> usize {
    history
        .iter()
        .rev()
        .filter(|turn| !turn.is_user())
        .take_while(|turn| turn.content.trim_end().ends_with('?'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questioning_history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("Which state are you in?"),
            ConversationTurn::user("AZ"),
            ConversationTurn::assistant("Do you prefer therapy or psychiatry?"),
            ConversationTurn::user("therapy"),
        ]
    }

    #[test]
    fn test_empty_and_filtered_replies_nudge() {
        let policy = NudgePolicy::default();
        assert_eq!(policy.evaluate(&Completion::stop("  "), &[]), Some(NudgeReason::Empty));

        let filtered = Completion {
            finish_reason: FinishReason::ContentFilter,
            ..Completion::stop("partial")
        };
        assert_eq!(policy.evaluate(&filtered, &[]), Some(NudgeReason::ContentFilter));
    }

    #[test]
    fn test_empty_truncated_reply_does_not_nudge() {
        let truncated = Completion {
            finish_reason: FinishReason::Length,
            ..Completion::stop("")
        };
        assert_eq!(NudgePolicy::default().evaluate(&truncated, &[]), None);
    }

    #[test]
    fn test_opener_after_questions_is_stalled() {
        let policy = NudgePolicy::default();
        let reply = Completion::stop("Thanks for sharing! Could you tell me a bit more about what you're looking for?");
        assert_eq!(policy.evaluate(&reply, &questioning_history()), Some(NudgeReason::Stalled));
    }

    #[test]
    fn test_opener_early_in_conversation_is_fine() {
        let reply = Completion::stop("Hello! How can I help you today?");
        assert_eq!(NudgePolicy::default().evaluate(&reply, &[]), None);
    }

    #[test]
    fn test_options_are_progress() {
        let reply = Completion::stop(
            "Here are two therapists in AZ:\n- [ ] 9:00 AM, Monday, 09/22/2025\nWould either work?",
        );
        assert_eq!(NudgePolicy::default().evaluate(&reply, &questioning_history()), None);
    }

    #[test]
    fn test_disabled_policy() {
        assert_eq!(NudgePolicy::disabled().evaluate(&Completion::stop(""), &[]), None);
    }
}
