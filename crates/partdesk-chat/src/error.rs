//! Error types for the conversational front end.

use partdesk_core::PartdeskError;
use partdesk_llm::LlmError;

/// Errors from session bookkeeping and pipeline wiring.
///
/// Message handling itself never fails; every problem inside a turn ends
/// up as a reply.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("startup error: {0}")]
    Startup(String),
}

impl From<PartdeskError> for ChatError {
    fn from(err: PartdeskError) -> Self {
        ChatError::Startup(err.to_string())
    }
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        ChatError::Startup(err.to_string())
    }
}
