//! Branching conversation model.

pub mod entities;
pub mod ids;
pub mod thread;

pub use entities::{Attachment, Message, MessageMetadata, MessageStatus, Role};
pub use ids::MessageId;
pub use thread::{ConversationThread, ThreadSnapshot};
