//! Intake domain - turns one chat request into a reply.

pub mod context;
pub mod error;
pub mod models;
pub mod nudge;
pub mod prompt;
pub mod service;
pub mod slots_reply;

pub use context::{build_availability_index, build_context, render_provider_card, ContextOptions, RenderedContext};
pub use error::ChatError;
pub use models::{ChatInput, ChatOutcome, DebugPayload, ReplySource};
pub use nudge::{NudgePolicy, NudgeReason};
pub use prompt::{build_messages, compose_system_prompt};
pub use service::{apply_length_marker, IntakeService, FALLBACK_REPLY, NOT_CONFIGURED_REPLY, TOKEN_LIMIT_REPLY};
pub use slots_reply::{pagination_anchor, try_slot_reply, SlotReply};
