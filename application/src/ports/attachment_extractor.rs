//! Attachment extraction port
//!
//! Turns the raw bytes of an uploaded file into plain text.

use thiserror::Error;

/// Errors that can occur while extracting text from a file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Could not decode file: {0}")]
    Decode(String),
}

/// Extracts text from file contents.
///
/// Failures are never fatal to a turn: the caller drops the file and
/// records a warning.
pub trait AttachmentExtractor: Send + Sync {
    /// Extract text from `bytes`; `extension` is the declared file
    /// extension without the dot, in any case.
    fn extract_text(&self, bytes: &[u8], extension: &str) -> Result<String, ExtractError>;

    /// Whether files with this extension are accepted at all
    fn supports(&self, extension: &str) -> bool;
}
