//! Conversation entities

use super::ids::MessageId;
use crate::quality::grade::GradeResult;
use crate::quality::rubric::Rubric;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Text extracted from an uploaded file (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name as uploaded
    pub name: String,
    /// Extracted text content
    pub text: String,
}

impl Attachment {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// How well an assistant answer met its rubric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Passed grading, or quality agents were bypassed
    Complete,
    /// A refinement step failed or the run was cancelled; the last good draft was kept
    PartialFailure,
    /// The iteration cap was reached without a passing grade
    MaxIterationsExhausted,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Complete => "complete",
            MessageStatus::PartialFailure => "partial_failure",
            MessageStatus::MaxIterationsExhausted => "max_iterations_exhausted",
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, MessageStatus::Complete)
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Refinement record attached to an assistant message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Rubric the answer was graded against (absent in bypass mode)
    pub rubric: Option<Rubric>,
    /// Every grade, in order
    pub grades: Vec<GradeResult>,
    /// Number of grading rounds performed
    pub iterations: usize,
    /// Non-fatal problems, e.g. dropped attachments
    pub warnings: Vec<String>,
    /// Explanation when the answer is not fully compliant
    pub notice: Option<String>,
}

impl MessageMetadata {
    /// The most recent grade, if any
    pub fn last_grade(&self) -> Option<&GradeResult> {
        self.grades.last()
    }
}

/// A message in a conversation thread (Entity)
///
/// Messages are immutable once created. Only
/// [`ConversationThread`](super::thread::ConversationThread) constructs
/// them, which is how parent links are kept valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    parent_id: Option<MessageId>,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
    attachments: Vec<Attachment>,
    status: Option<MessageStatus>,
    metadata: Option<MessageMetadata>,
}

impl Message {
    pub(crate) fn user(
        parent_id: Option<MessageId>,
        content: String,
        attachments: Vec<Attachment>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            parent_id,
            role: Role::User,
            content,
            created_at: Utc::now(),
            attachments,
            status: None,
            metadata: None,
        }
    }

    pub(crate) fn assistant(
        parent_id: Option<MessageId>,
        content: String,
        status: MessageStatus,
        metadata: MessageMetadata,
    ) -> Self {
        Self {
            id: MessageId::new(),
            parent_id,
            role: Role::Assistant,
            content,
            created_at: Utc::now(),
            attachments: Vec::new(),
            status: Some(status),
            metadata: Some(metadata),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn parent_id(&self) -> Option<MessageId> {
        self.parent_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Completion status (assistant messages only)
    pub fn status(&self) -> Option<MessageStatus> {
        self.status
    }

    /// Refinement record (assistant messages only)
    pub fn metadata(&self) -> Option<&MessageMetadata> {
        self.metadata.as_ref()
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
