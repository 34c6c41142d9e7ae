//! Schedules domain - open appointment slots per provider.

pub mod display;
pub mod index;
pub mod models;
pub mod parser;

pub use display::{checklist_item, format_datetime, format_slot, latest_shown_timestamp};
pub use index::ScheduleIndex;
pub use models::Slot;
pub use parser::parse_schedule;
