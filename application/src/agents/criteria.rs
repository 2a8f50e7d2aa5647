//! LLM-backed criteria agent

use super::{AgentError, CriteriaAgent, call_gateway};
use crate::ports::llm_gateway::{GenerationOptions, GenerationRequest, LlmGateway};
use async_trait::async_trait;
use draftsmith_domain::quality::parse_criteria_list;
use draftsmith_domain::{AgentRole, Attachment, ModelTier, PromptTemplate, Rubric, WordCountAnalyzer};
use std::sync::Arc;
use tracing::debug;

/// Builds a rubric from one model call plus local word-target detection.
///
/// The model decides the qualitative criteria. The word target always
/// comes from [`WordCountAnalyzer`], whatever the model says about length.
pub struct LlmCriteriaAgent {
    gateway: Arc<dyn LlmGateway>,
    tier: ModelTier,
    analyzer: WordCountAnalyzer,
}

impl LlmCriteriaAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, tier: ModelTier) -> Self {
        Self {
            gateway,
            tier,
            analyzer: WordCountAnalyzer::new(),
        }
    }
}

#[async_trait]
impl CriteriaAgent for LlmCriteriaAgent {
    async fn build_rubric(
        &self,
        prompt: &str,
        attachments: &[Attachment],
        tolerance: f64,
    ) -> Result<Rubric, AgentError> {
        let request = GenerationRequest::new(
            PromptTemplate::criteria_prompt(prompt),
            GenerationOptions::new(self.tier),
        )
        .with_attachments(attachments.to_vec());

        let response = call_gateway(self.gateway.as_ref(), AgentRole::Criteria, request).await?;
        let criteria = parse_criteria_list(&response);
        let word_target = self.analyzer.detect_target(prompt);

        debug!(
            criteria = criteria.len(),
            word_target = ?word_target,
            "Rubric built"
        );

        Ok(Rubric::new(criteria)
            .with_word_target(word_target)
            .with_tolerance(tolerance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::MockGateway;
    use crate::ports::llm_gateway::GatewayError;
    use draftsmith_domain::WordTarget;

    #[tokio::test]
    async fn test_word_target_comes_from_prompt() {
        let gateway = Arc::new(MockGateway::replying(&[
            "1. Explains tides\n2. Must be about 1000 words\n3. Mentions the moon",
        ]));
        let agent = LlmCriteriaAgent::new(gateway.clone(), ModelTier::Capable);

        let rubric = agent
            .build_rubric("Write a 200-300 word note on tides", &[], 0.1)
            .await
            .unwrap();

        assert_eq!(rubric.criteria, vec!["Explains tides", "Mentions the moon"]);
        assert_eq!(rubric.word_target, Some(WordTarget::range(200, 300)));
        assert_eq!(rubric.tolerance, 0.1);
        assert_eq!(gateway.call_count(), 1);
    }

    #[tokio::test]
    async fn test_attachments_are_forwarded() {
        let gateway = Arc::new(MockGateway::replying(&["- Summarises the notes"]));
        let agent = LlmCriteriaAgent::new(gateway.clone(), ModelTier::Capable);

        agent
            .build_rubric("Summarise", &[Attachment::new("n.txt", "notes")], 0.1)
            .await
            .unwrap();

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].attachments.len(), 1);
        assert_eq!(requests[0].options.model_tier, ModelTier::Capable);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_agent_error() {
        let gateway = Arc::new(MockGateway::new(vec![Err(GatewayError::Timeout)]));
        let agent = LlmCriteriaAgent::new(gateway, ModelTier::Capable);
        let err = agent.build_rubric("x", &[], 0.1).await.unwrap_err();
        assert_eq!(err.role(), AgentRole::Criteria);
    }
}
