//! Refinement agents.
//!
//! Each role is a trait with one fixed method, so the orchestrator can be
//! driven by LLM-backed agents in production and by stubs in tests. Every
//! LLM-backed agent makes at most one gateway call per invocation and never
//! retries.

mod criteria;
mod generation;
mod grader;
mod refiner;

pub use criteria::LlmCriteriaAgent;
pub use generation::LlmGenerationAgent;
pub use grader::LlmGraderAgent;
pub use refiner::LlmRefinerAgent;

use crate::ports::llm_gateway::{ContextEntry, GatewayError, GenerationRequest, LlmGateway};
use async_trait::async_trait;
use draftsmith_domain::{AgentModels, AgentRole, Attachment, GradeResult, Rubric};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by an agent call
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{role} agent failed: {source}")]
    Gateway {
        role: AgentRole,
        #[source]
        source: GatewayError,
    },

    #[error("{0} agent returned an empty response")]
    EmptyResponse(AgentRole),
}

impl AgentError {
    /// Role of the agent that failed
    pub fn role(&self) -> AgentRole {
        match self {
            AgentError::Gateway { role, .. } => *role,
            AgentError::EmptyResponse(role) => *role,
        }
    }
}

/// Backend tools the generation agent may use for the first draft
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DraftTools {
    pub search: bool,
    pub code_execution: bool,
}

/// Builds the rubric for a user turn
#[async_trait]
pub trait CriteriaAgent: Send + Sync {
    async fn build_rubric(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        tolerance: f64,
    ) -> Result<Rubric, AgentError>;
}

/// Writes the first draft
#[async_trait]
pub trait GenerationAgent: Send + Sync {
    async fn generate_draft(
        &self,
        prompt: &str,
        context: &[ContextEntry],
        attachments: &[Attachment],
        tools: DraftTools,
    ) -> Result<String, AgentError>;
}

/// Judges a draft against a rubric
#[async_trait]
pub trait GraderAgent: Send + Sync {
    async fn grade(&self, draft: &str, rubric: &Rubric) -> Result<GradeResult, AgentError>;
}

/// Rewrites a draft using grader feedback
#[async_trait]
pub trait RefinerAgent: Send + Sync {
    async fn refine(
        &self,
        prompt: &str,
        previous_draft: &str,
        grade: &GradeResult,
        rubric: &Rubric,
    ) -> Result<String, AgentError>;
}

/// The four agents a refinement run needs
#[derive(Clone)]
pub struct AgentSet {
    pub criteria: Arc<dyn CriteriaAgent>,
    pub generation: Arc<dyn GenerationAgent>,
    pub grader: Arc<dyn GraderAgent>,
    pub refiner: Arc<dyn RefinerAgent>,
}

impl AgentSet {
    pub fn new(
        criteria: Arc<dyn CriteriaAgent>,
        generation: Arc<dyn GenerationAgent>,
        grader: Arc<dyn GraderAgent>,
        refiner: Arc<dyn RefinerAgent>,
    ) -> Self {
        Self {
            criteria,
            generation,
            grader,
            refiner,
        }
    }

    /// LLM-backed agents sharing one gateway, each on its configured tier
    pub fn llm(gateway: Arc<dyn LlmGateway>, models: AgentModels) -> Self {
        Self {
            criteria: Arc::new(LlmCriteriaAgent::new(
                gateway.clone(),
                models.tier_for(AgentRole::Criteria),
            )),
            generation: Arc::new(LlmGenerationAgent::new(
                gateway.clone(),
                models.tier_for(AgentRole::Generation),
            )),
            grader: Arc::new(LlmGraderAgent::new(
                gateway.clone(),
                models.tier_for(AgentRole::Grader),
            )),
            refiner: Arc::new(LlmRefinerAgent::new(
                gateway,
                models.tier_for(AgentRole::Refiner),
            )),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_criteria(mut self, agent: Arc<dyn CriteriaAgent>) -> Self {
        self.criteria = agent;
        self
    }

    pub fn with_generation(mut self, agent: Arc<dyn GenerationAgent>) -> Self {
        self.generation = agent;
        self
    }

    pub fn with_grader(mut self, agent: Arc<dyn GraderAgent>) -> Self {
        self.grader = agent;
        self
    }

    pub fn with_refiner(mut self, agent: Arc<dyn RefinerAgent>) -> Self {
        self.refiner = agent;
        self
    }
}

/// Send one request and reject blank replies
pub(crate) async fn call_gateway(
    gateway: &dyn LlmGateway,
    role: AgentRole,
    request: GenerationRequest,
) -> Result<String, AgentError> {
    let text = gateway
        .generate(request)
        .await
        .map_err(|source| AgentError::Gateway { role, source })?;

    let text = text.trim();
    if text.is_empty() {
        return Err(AgentError::EmptyResponse(role));
    }
    Ok(text.to_string())
}


#[cfg(test)]
mod tests {
    use super::test_support::MockGateway;
    use super::*;
    use crate::ports::llm_gateway::GenerationOptions;
    use draftsmith_domain::ModelTier;

    #[tokio::test]
    async fn test_call_gateway_trims() {
        let gateway = MockGateway::replying(&["  text \n"]);
        let request = GenerationRequest::new("p", GenerationOptions::new(ModelTier::Fast));
        let text = call_gateway(&gateway, AgentRole::Generation, request)
            .await
            .unwrap();
        assert_eq!(text, "text");
    }

    #[tokio::test]
    async fn test_call_gateway_empty_is_error() {
        let gateway = MockGateway::replying(&["   "]);
        let request = GenerationRequest::new("p", GenerationOptions::new(ModelTier::Fast));
        let err = call_gateway(&gateway, AgentRole::Refiner, request)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse(AgentRole::Refiner)));
        assert_eq!(err.role(), AgentRole::Refiner);
    }

    #[tokio::test]
    async fn test_call_gateway_wraps_gateway_error() {
        let gateway = MockGateway::new(vec![Err(GatewayError::Timeout)]);
        let request = GenerationRequest::new("p", GenerationOptions::new(ModelTier::Fast));
        let err = call_gateway(&gateway, AgentRole::Criteria, request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AgentError::Gateway {
                role: AgentRole::Criteria,
                source: GatewayError::Timeout
            }
        ));
    }

    #[tokio::test]
    async fn test_llm_set_uses_configured_tiers() {
        let gateway = Arc::new(MockGateway::replying(&["draft"]));
        let agents = AgentSet::llm(gateway.clone(), AgentModels::default());
        agents
            .generation
            .generate_draft("q", &[], &[], DraftTools::default())
            .await
            .unwrap();
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].options.model_tier, ModelTier::Capable);
    }
}
