//! Branching conversation store.
//!
//! Messages live in a flat arena keyed by [`MessageId`]. Each message only
//! knows its parent; children are found by scanning, so the structure can
//! never contain a cycle. The single mutable cursor is `active_leaf_id`,
//! which selects the conversation path currently shown to the user.
//!
//! ```text
//! R ── A ── B          (original branch, still reachable)
//!  └── A' ── B'        (fork created by editing A)
//! ```

use super::entities::{Attachment, Message, MessageMetadata, MessageStatus, Role};
use super::ids::MessageId;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Forest of messages for one session plus the active-path cursor
#[derive(Debug, Clone, Default)]
pub struct ConversationThread {
    messages: HashMap<MessageId, Message>,
    /// Insertion order, for deterministic listings
    order: Vec<MessageId>,
    active_leaf_id: Option<MessageId>,
}

/// Read-only view of a thread for rendering
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadSnapshot {
    pub active_leaf_id: Option<MessageId>,
    /// Root-first chain ending at the active leaf
    pub active_path: Vec<Message>,
    /// Every message in insertion order, including inactive branches
    pub messages: Vec<Message>,
}

impl ConversationThread {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.get(&id)
    }

    fn require(&self, id: MessageId) -> Result<&Message, DomainError> {
        self.messages
            .get(&id)
            .ok_or(DomainError::MessageNotFound(id))
    }

    fn ensure_parent(&self, parent_id: Option<MessageId>) -> Result<(), DomainError> {
        match parent_id {
            Some(id) => self.require(id).map(|_| ()),
            None => Ok(()),
        }
    }

    fn insert(&mut self, message: Message) -> Message {
        let id = message.id();
        self.order.push(id);
        self.messages.insert(id, message.clone());
        message
    }

    /// Append a message under `parent_id` (`None` starts a new root).
    ///
    /// User messages become the active leaf immediately, so the turn being
    /// generated can read its own prompt as the latest ancestor. Assistant
    /// messages appended this way are treated as complete answers.
    pub fn append(
        &mut self,
        parent_id: Option<MessageId>,
        role: Role,
        content: impl Into<String>,
        attachments: Vec<Attachment>,
    ) -> Result<Message, DomainError> {
        match role {
            Role::User => {
                self.ensure_parent(parent_id)?;
                let message = self.insert(Message::user(parent_id, content.into(), attachments));
                self.active_leaf_id = Some(message.id());
                Ok(message)
            }
            Role::Assistant => self.append_assistant(
                parent_id,
                content,
                MessageStatus::Complete,
                MessageMetadata::default(),
            ),
        }
    }

    /// Commit the result of a refinement run.
    ///
    /// Only finished runs reach this point (failed runs append nothing), so
    /// the active leaf always moves to the committed answer.
    pub fn append_assistant(
        &mut self,
        parent_id: Option<MessageId>,
        content: impl Into<String>,
        status: MessageStatus,
        metadata: MessageMetadata,
    ) -> Result<Message, DomainError> {
        self.ensure_parent(parent_id)?;
        let message = self.insert(Message::assistant(
            parent_id,
            content.into(),
            status,
            metadata,
        ));
        self.active_leaf_id = Some(message.id());
        Ok(message)
    }

    /// Ancestors of `message_id`, root first, ending with the message itself.
    pub fn context_path(&self, message_id: MessageId) -> Result<Vec<&Message>, DomainError> {
        let mut path = Vec::new();
        let mut cursor = Some(message_id);
        while let Some(id) = cursor {
            let message = self.require(id)?;
            path.push(message);
            cursor = message.parent_id();
        }
        path.reverse();
        Ok(path)
    }

    /// Create an edited copy of a past user message as a sibling branch.
    ///
    /// The original message and everything below it are left untouched and
    /// can be re-selected with [`select_leaf`](Self::select_leaf).
    pub fn fork_edit(
        &mut self,
        original_message_id: MessageId,
        new_content: impl Into<String>,
    ) -> Result<Message, DomainError> {
        let original = self.require(original_message_id)?;
        if !original.is_user() {
            return Err(DomainError::NotAUserMessage(original_message_id));
        }
        let parent_id = original.parent_id();
        let attachments = original.attachments().to_vec();
        self.append(parent_id, Role::User, new_content, attachments)
    }

    /// Drop every message and the cursor
    pub fn clear(&mut self) {
        self.messages.clear();
        self.order.clear();
        self.active_leaf_id = None;
    }

    pub fn active_leaf_id(&self) -> Option<MessageId> {
        self.active_leaf_id
    }

    pub fn active_leaf(&self) -> Option<&Message> {
        self.active_leaf_id.and_then(|id| self.messages.get(&id))
    }

    /// The current conversation path, root first
    pub fn active_path(&self) -> Vec<&Message> {
        match self.active_leaf_id {
            Some(id) => self.context_path(id).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Point the cursor at an existing message, e.g. to return to an older branch
    pub fn select_leaf(&mut self, id: MessageId) -> Result<(), DomainError> {
        self.require(id)?;
        self.active_leaf_id = Some(id);
        Ok(())
    }

    /// Direct children of `id`, oldest first
    pub fn children(&self, id: MessageId) -> Vec<&Message> {
        self.iter().filter(|m| m.parent_id() == Some(id)).collect()
    }

    pub fn roots(&self) -> Vec<&Message> {
        self.iter().filter(|m| m.is_root()).collect()
    }

    /// Messages without children: the tips of every branch
    pub fn leaves(&self) -> Vec<&Message> {
        self.iter()
            .filter(|m| !self.messages.values().any(|c| c.parent_id() == Some(m.id())))
            .collect()
    }

    /// Resolve a user-typed id prefix to exactly one message
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Message> {
        let mut matches = self.iter().filter(|m| m.id().matches_prefix(prefix));
        match (matches.next(), matches.next()) {
            (Some(found), None) => Some(found),
            _ => None,
        }
    }

    /// All messages in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.order.iter().filter_map(|id| self.messages.get(id))
    }

    pub fn snapshot(&self) -> ThreadSnapshot {
        ThreadSnapshot {
            active_leaf_id: self.active_leaf_id,
            active_path: self.active_path().into_iter().cloned().collect(),
            messages: self.iter().cloned().collect(),
        }
    }
}
