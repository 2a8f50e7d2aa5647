//! LLM-backed refiner agent

use super::{AgentError, RefinerAgent, call_gateway};
use crate::ports::llm_gateway::{GenerationOptions, GenerationRequest, LlmGateway};
use async_trait::async_trait;
use draftsmith_domain::{AgentRole, GradeResult, ModelTier, PromptTemplate, Rubric};
use std::sync::Arc;

/// Rewrites a draft so that the failed checks of its last grade pass.
pub struct LlmRefinerAgent {
    gateway: Arc<dyn LlmGateway>,
    tier: ModelTier,
}

impl LlmRefinerAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, tier: ModelTier) -> Self {
        Self { gateway, tier }
    }
}

#[async_trait]
impl RefinerAgent for LlmRefinerAgent {
    async fn refine(
        &self,
        prompt: &str,
        previous_draft: &str,
        grade: &GradeResult,
        rubric: &Rubric,
    ) -> Result<String, AgentError> {
        let request = GenerationRequest::new(
            PromptTemplate::refiner_prompt(prompt, previous_draft, grade, rubric),
            GenerationOptions::new(self.tier),
        );
        call_gateway(self.gateway.as_ref(), AgentRole::Refiner, request).await
    }
}
