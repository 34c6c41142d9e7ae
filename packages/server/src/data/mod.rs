//! On-disk inputs: the provider directory, the schedule, and instruction files.

pub mod instructions;
pub mod snapshot;

pub use instructions::{InstructionFiles, Instructions, DEFAULT_SYSTEM_PROMPT};
pub use snapshot::{DataFiles, DirectorySnapshot, ReloadMode, SnapshotStore};
