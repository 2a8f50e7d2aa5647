//! Domain error types

use crate::conversation::ids::MessageId;
use thiserror::Error;

/// Domain-level errors
///
/// These indicate integrity problems with the conversation store and are
/// never downgraded: a missing parent means the thread is corrupt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Message {0} is not a user message")]
    NotAUserMessage(MessageId),

    #[error("Conversation thread is empty")]
    EmptyThread,
}

impl DomainError {
    /// Check if this error is a missing-message integrity violation
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::MessageNotFound(_))
    }
}
