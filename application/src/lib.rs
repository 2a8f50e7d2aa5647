//! Application layer for draftsmith
//!
//! This crate contains the refinement agents, the orchestrator, session use
//! cases and port definitions. It depends only on the domain layer.

pub mod agents;
pub mod config;
pub mod ports;
pub mod session;
pub mod use_cases;

// Re-export commonly used types
pub use agents::{
    AgentError, AgentSet, CriteriaAgent, DraftTools, GenerationAgent, GraderAgent,
    LlmCriteriaAgent, LlmGenerationAgent, LlmGraderAgent, LlmRefinerAgent, RefinerAgent,
};
pub use config::RefinementParams;
pub use ports::{
    attachment_extractor::{AttachmentExtractor, ExtractError},
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    llm_gateway::{
        ContextEntry, GatewayError, GenerationOptions, GenerationRequest, LlmGateway,
    },
    progress::{ChannelProgress, NoProgress, ProgressEvent, ProgressNotifier},
};
pub use session::{SessionContext, SessionError};
pub use use_cases::load_attachments::LoadAttachmentsUseCase;
pub use use_cases::run_refinement::{
    RefinementInput, RefinementOrchestrator, RunRefinementError,
};
pub use use_cases::submit_turn::{SubmitTurnError, SubmitTurnUseCase, TurnOutcome, TurnRequest};
