//! Hints domain - soft signals read out of the conversation.
//!
//! Each signal is a pure function over text. [`extract_hints`] applies them
//! to the latest message first and then to earlier user turns, newest first;
//! the first text carrying a signal decides it. Assistant turns are never
//! scanned, since they echo options back ("therapy, psychiatry, or both?").

pub mod intent;
pub mod language;
pub mod payment;
pub mod role;
pub mod state;

use serde::Serialize;

use crate::common::ConversationTurn;

pub use intent::{detect_slot_request, wants_list, SlotRequest};
pub use language::detect_language;
pub use payment::detect_insurer;
pub use role::{detect_role, RolePreference};
pub use state::{detect_state, find_state_mentions};

/// Signals for one request. Every field is best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Hints {
    pub state: Option<String>,
    pub insurer: Option<String>,
    pub role_preference: Option<RolePreference>,
    pub language: Option<String>,
    pub wants_list: bool,
}

pub fn extract_hints(message: &str, history: &[ConversationTurn]) -> Hints {
    let texts: Vec<&str> = std::iter::once(message)
        .chain(
            history
                .iter()
                .rev()
                .filter(|turn| turn.is_user())
                .map(|turn| turn.content.as_str()),
        )
        .collect();

    Hints {
        state: first_signal(&texts, detect_state).map(str::to_string),
        insurer: first_signal(&texts, detect_insurer).map(str::to_string),
        role_preference: first_signal(&texts, detect_role),
        language: first_signal(&texts, detect_language).map(str::to_string),
        wants_list: wants_list(message),
    }
}

fn first_signal<T>(texts: &[&str], detect: impl Fn(&str) -> Option<T>) -> Option<T> {
    texts.iter().find_map(|text| detect(text))
}
