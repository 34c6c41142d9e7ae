// Common types and utilities shared across the application

pub mod conversation;
pub mod text;
pub mod us_states;

pub use conversation::{last_assistant_turn, normalize_history, ConversationTurn, TurnRole};
pub use text::{fold_for_matching, normalize_line, normalize_text};
