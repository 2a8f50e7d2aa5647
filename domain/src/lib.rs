//! Domain layer for draftsmith
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Conversation thread
//!
//! Messages form a forest: every message points at its parent, and a
//! single active-leaf cursor selects the path the user is looking at.
//! Editing an earlier prompt forks a sibling branch instead of rewriting
//! history.
//!
//! ## Refinement
//!
//! An answer is drafted, graded against a rubric (qualitative criteria
//! plus an optional word-count target), and refined until it passes or
//! the iteration budget runs out.

pub mod agent;
pub mod config;
pub mod conversation;
pub mod core;
pub mod prompt;
pub mod quality;
pub mod refinement;
pub mod util;

// Re-export commonly used types
pub use agent::{AgentModels, AgentRole};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use conversation::{
    Attachment, ConversationThread, Message, MessageId, MessageMetadata, MessageStatus, Role,
    ThreadSnapshot,
};
pub use core::{error::DomainError, model::ModelTier};
pub use prompt::PromptTemplate;
pub use quality::{
    CriterionFeedback, DEFAULT_TOLERANCE, GradeResult, Rubric, TextStats, Verdict,
    WordCountAnalyzer, WordTarget,
};
pub use refinement::{
    DEFAULT_MAX_ITERATIONS, FallbackReason, MAX_ITERATIONS, MIN_ITERATIONS, RefinementPhase,
    RefinementReport, RefinementRun, RunOutcome, clamp_iterations,
};
