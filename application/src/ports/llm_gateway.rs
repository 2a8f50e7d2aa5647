//! LLM Gateway port
//!
//! Defines the interface for communicating with the text generation backend.

use async_trait::async_trait;
use draftsmith_domain::{Attachment, Message, ModelTier, Role};
use thiserror::Error;

/// Errors that can occur during LLM gateway operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

impl GatewayError {
    /// Errors that a later call might not hit again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GatewayError::ConnectionError(_) | GatewayError::Unavailable(_) | GatewayError::Timeout
        )
    }
}

/// One earlier conversation turn passed as context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub role: Role,
    pub content: String,
}

impl ContextEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Context entries for an ancestor chain, root first
    pub fn from_path<'a>(path: impl IntoIterator<Item = &'a Message>) -> Vec<Self> {
        path.into_iter()
            .map(|m| Self::new(m.role(), m.content()))
            .collect()
    }
}

/// Per-call generation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationOptions {
    pub model_tier: ModelTier,
    /// Let the backend ground the answer with web search
    pub search_grounding: bool,
    /// Let the backend run code while answering
    pub code_execution: bool,
}

impl GenerationOptions {
    pub fn new(model_tier: ModelTier) -> Self {
        Self {
            model_tier,
            search_grounding: false,
            code_execution: false,
        }
    }

    pub fn with_search(mut self, enabled: bool) -> Self {
        self.search_grounding = enabled;
        self
    }

    pub fn with_code_execution(mut self, enabled: bool) -> Self {
        self.code_execution = enabled;
        self
    }
}

/// A single generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    /// Optional system instruction
    pub system: Option<String>,
    pub prompt: String,
    /// Earlier turns, oldest first
    pub context: Vec<ContextEntry>,
    /// Extracted file contents
    pub attachments: Vec<Attachment>,
    pub options: GenerationOptions,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            prompt: prompt.into(),
            options,
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_context(mut self, context: Vec<ContextEntry>) -> Self {
        self.context = context;
        self
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = attachments;
        self
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer talks to the generation
/// backend. Implementations (adapters) live in the infrastructure layer.
/// One call is one request; retries are the adapter's business.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Generate text for a request
    async fn generate(&self, request: GenerationRequest) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = GenerationRequest::new(
            "hi",
            GenerationOptions::new(ModelTier::Fast).with_search(true),
        )
        .with_system("be brief")
        .with_context(vec![ContextEntry::new(Role::User, "earlier")]);

        assert_eq!(request.prompt, "hi");
        assert_eq!(request.system.as_deref(), Some("be brief"));
        assert_eq!(request.context.len(), 1);
        assert!(request.options.search_grounding);
        assert!(!request.options.code_execution);
        assert_eq!(request.options.model_tier, ModelTier::Fast);
    }

    #[test]
    fn test_transient_errors() {
        assert!(GatewayError::Timeout.is_transient());
        assert!(GatewayError::Unavailable("503".into()).is_transient());
        assert!(!GatewayError::AuthenticationError("x".into()).is_transient());
    }
}
