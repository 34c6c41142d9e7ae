// Behavioral Health Intake - API Core
//
// This crate provides the backend for a conversational intake assistant:
// it parses the provider directory and schedule files, reads soft signals out
// of the conversation, matches providers, and grounds the model's reply in a
// budgeted context block.
//
// Domain logic lives in domains/*; external services sit behind kernel traits.

pub mod common;
pub mod config;
pub mod data;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
