//! LLM-backed generation agent

use super::{AgentError, DraftTools, GenerationAgent, call_gateway};
use crate::ports::llm_gateway::{ContextEntry, GenerationOptions, GenerationRequest, LlmGateway};
use async_trait::async_trait;
use draftsmith_domain::{AgentRole, Attachment, ModelTier, PromptTemplate};
use std::sync::Arc;

/// Writes the first draft from the prompt, the conversation path and any
/// attached files.
pub struct LlmGenerationAgent {
    gateway: Arc<dyn LlmGateway>,
    tier: ModelTier,
}

impl LlmGenerationAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, tier: ModelTier) -> Self {
        Self { gateway, tier }
    }
}

#[async_trait]
impl GenerationAgent for LlmGenerationAgent {
    async fn generate_draft(
        &self,
        prompt: &str,
        context: &[ContextEntry],
        attachments: &[Attachment],
        tools: DraftTools,
    ) -> Result<String, AgentError> {
        let request = GenerationRequest::new(
            prompt.trim(),
            GenerationOptions::new(self.tier)
                .with_search(tools.search)
                .with_code_execution(tools.code_execution),
        )
        .with_system(PromptTemplate::generation_system())
        .with_context(context.to_vec())
        .with_attachments(attachments.to_vec());

        call_gateway(self.gateway.as_ref(), AgentRole::Generation, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::MockGateway;
    use draftsmith_domain::Role;

    #[tokio::test]
    async fn test_request_carries_context_and_search() {
        let gateway = Arc::new(MockGateway::replying(&["The tide rises."]));
        let agent = LlmGenerationAgent::new(gateway.clone(), ModelTier::Capable);
        let context = vec![
            ContextEntry::new(Role::User, "What is a tide?"),
            ContextEntry::new(Role::Assistant, "A tide is..."),
        ];

        let draft = agent
            .generate_draft(
                "And why?",
                &context,
                &[],
                DraftTools {
                    search: true,
                    code_execution: false,
                },
            )
            .await
            .unwrap();

        assert_eq!(draft, "The tide rises.");
        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].context, context);
        assert!(requests[0].options.search_grounding);
        assert!(!requests[0].options.code_execution);
        assert!(requests[0].system.is_some());
    }

    #[tokio::test]
    async fn test_code_execution_requested_when_enabled() {
        let gateway = Arc::new(MockGateway::replying(&["42"]));
        let agent = LlmGenerationAgent::new(gateway.clone(), ModelTier::Capable);
        let tools = DraftTools {
            search: false,
            code_execution: true,
        };
        agent
            .generate_draft("Sum the first 8 primes", &[], &[], tools)
            .await
            .unwrap();

        let options = gateway.requests.lock().unwrap()[0].options;
        assert!(options.code_execution);
        assert!(!options.search_grounding);
    }

    #[tokio::test]
    async fn test_empty_draft_is_error() {
        let gateway = Arc::new(MockGateway::replying(&[""]));
        let agent = LlmGenerationAgent::new(gateway, ModelTier::Capable);
        let err = agent
            .generate_draft("q", &[], &[], DraftTools::default()).await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyResponse(AgentRole::Generation)));
    }
}
