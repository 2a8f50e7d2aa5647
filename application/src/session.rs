//! Per-session state.
//!
//! A [`SessionContext`] owns one conversation thread and the settings used
//! for its next turn. Nothing here is process-wide: a chat REPL holds one
//! context, a single-shot invocation creates one and drops it.

use crate::config::RefinementParams;
use draftsmith_domain::{ConversationThread, MessageId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("A refinement run is already in progress for this conversation")]
    RunInProgress,
}

/// Conversation thread, settings and the in-flight marker
#[derive(Debug, Default)]
pub struct SessionContext {
    pub thread: ConversationThread,
    pub settings: RefinementParams,
    in_flight: bool,
    /// Warnings of user messages whose run failed, kept for a retry
    unanswered_warnings: HashMap<MessageId, Vec<String>>,
}

impl SessionContext {
    pub fn new(settings: RefinementParams) -> Self {
        Self {
            thread: ConversationThread::new(),
            settings,
            in_flight: false,
            unanswered_warnings: HashMap::new(),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Mark a run as started; at most one run per thread
    pub fn begin_run(&mut self) -> Result<(), SessionError> {
        if self.in_flight {
            return Err(SessionError::RunInProgress);
        }
        self.in_flight = true;
        Ok(())
    }

    pub fn finish_run(&mut self) {
        self.in_flight = false;
    }

    /// Remember the warnings of a turn that ended without an answer
    pub fn keep_warnings(&mut self, user_id: MessageId, warnings: Vec<String>) {
        if !warnings.is_empty() {
            self.unanswered_warnings.insert(user_id, warnings);
        }
    }

    /// Hand back the warnings kept for `user_id`, if any
    pub fn take_warnings(&mut self, user_id: MessageId) -> Vec<String> {
        self.unanswered_warnings
            .remove(&user_id)
            .unwrap_or_default()
    }

    /// Forget the conversation; settings are kept
    pub fn clear(&mut self) {
        self.thread.clear();
        self.in_flight = false;
        self.unanswered_warnings.clear();
    }
}
