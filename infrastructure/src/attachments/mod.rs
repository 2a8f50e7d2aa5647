//! Attachment extraction adapters.

mod local;

pub use local::{LocalAttachmentExtractor, SUPPORTED_EXTENSIONS};
