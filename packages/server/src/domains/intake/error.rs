use thiserror::Error;

use crate::kernel::CompletionError;

/// Failures of one chat request.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or malformed input; nothing downstream was attempted
    #[error("{0}")]
    InvalidInput(String),

    /// The completion service answered with a failure
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        detail: serde_json::Value,
        message: String,
    },

    #[error("Completion timed out after {0}s")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CompletionError> for ChatError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Timeout(secs) => ChatError::Timeout(secs),
            CompletionError::Upstream {
                status,
                detail,
                message,
            } => ChatError::Upstream {
                status,
                detail,
                message,
            },
        }
    }
}
