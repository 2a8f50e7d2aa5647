//! Infrastructure layer for draftsmith
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod attachments;
pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use attachments::LocalAttachmentExtractor;
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileLoggingConfig, FileModelsConfig,
    FileOutputConfig, FileOutputFormat, FileProviderConfig, FileRefinementConfig, FileReplConfig,
};
pub use logging::JsonlConversationLogger;
pub use providers::{GeminiConfig, GeminiGateway};
