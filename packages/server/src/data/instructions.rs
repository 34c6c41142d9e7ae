//! Operator-authored instruction files: the system prompt, FAQ and policy
//! notes. Read once at startup.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::common::normalize_text;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful behavioral health intake assistant.";

pub const SYSTEM_PROMPT_FILE: &str = "system_prompt.txt";
pub const FAQS_FILE: &str = "faqs.txt";
pub const POLICIES_FILE: &str = "policies.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions {
    pub system_prompt: Option<String>,
    pub faqs: Option<String>,
    pub policies: Option<String>,
}

/// Which instruction files were found and non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InstructionFiles {
    pub system_prompt: bool,
    pub faqs: bool,
    pub policies: bool,
}

impl Instructions {
    pub async fn load(dir: &Path) -> Self {
        let instructions = Self {
            system_prompt: read_instruction(&dir.join(SYSTEM_PROMPT_FILE)).await,
            faqs: read_instruction(&dir.join(FAQS_FILE)).await,
            policies: read_instruction(&dir.join(POLICIES_FILE)).await,
        };

        info!(
            dir = %dir.display(),
            system_prompt = instructions.system_prompt.is_some(),
            faqs = instructions.faqs.is_some(),
            policies = instructions.policies.is_some(),
            "Loaded instruction files"
        );

        instructions
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn files(&self) -> InstructionFiles {
        InstructionFiles {
            system_prompt: self.system_prompt.is_some(),
            faqs: self.faqs.is_some(),
            policies: self.policies.is_some(),
        }
    }
}

/// Normalized file contents; missing, unreadable or blank files are None.
async fn read_instruction(path: &Path) -> Option<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) => Some(normalize_text(&raw)).filter(|text| !text.is_empty()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read instruction file");
            None
        }
    }
}
