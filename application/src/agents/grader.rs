//! LLM-backed grader agent

use super::{AgentError, GraderAgent, call_gateway};
use crate::ports::llm_gateway::{GenerationOptions, GenerationRequest, LlmGateway};
use async_trait::async_trait;
use draftsmith_domain::quality::parse_verdicts;
use draftsmith_domain::{AgentRole, GradeResult, ModelTier, PromptTemplate, Rubric, WordCountAnalyzer};
use std::sync::Arc;
use tracing::debug;

/// Grades a draft: word count locally, qualitative criteria by the model.
pub struct LlmGraderAgent {
    gateway: Arc<dyn LlmGateway>,
    tier: ModelTier,
    analyzer: WordCountAnalyzer,
}

impl LlmGraderAgent {
    pub fn new(gateway: Arc<dyn LlmGateway>, tier: ModelTier) -> Self {
        Self {
            gateway,
            tier,
            analyzer: WordCountAnalyzer::new(),
        }
    }
}

#[async_trait]
impl GraderAgent for LlmGraderAgent {
    async fn grade(&self, draft: &str, rubric: &Rubric) -> Result<GradeResult, AgentError> {
        let actual = self.analyzer.count_words(draft);
        let word_count_ok = rubric
            .word_target
            .is_none_or(|target| self.analyzer.within_tolerance(actual, target, rubric.tolerance));

        if !rubric.has_criteria() {
            debug!(words = actual, word_count_ok, "Graded on word count only");
            return Ok(GradeResult::new(Vec::new(), actual, word_count_ok));
        }

        let request = GenerationRequest::new(
            PromptTemplate::grader_prompt(draft, rubric, actual),
            GenerationOptions::new(self.tier),
        );
        let response = call_gateway(self.gateway.as_ref(), AgentRole::Grader, request).await?;
        let feedback = parse_verdicts(&response, &rubric.criteria);

        Ok(GradeResult::new(feedback, actual, word_count_ok))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::test_support::MockGateway;
    use draftsmith_domain::quality::parsing::MISSING_VERDICT_NOTE;
    use draftsmith_domain::{Verdict, WordTarget};

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[tokio::test]
    async fn test_pass_requires_verdicts_and_length() {
        let gateway = Arc::new(MockGateway::replying(&["1. PASS - clear\n2. PASS - accurate"]));
        let agent = LlmGraderAgent::new(gateway, ModelTier::Fast);
        let rubric = Rubric::new(vec!["Clear".into(), "Accurate".into()])
            .with_word_target(Some(WordTarget::exact(50)));

        let grade = agent.grade(&words(52), &rubric).await.unwrap();
        assert!(grade.passed());
        assert_eq!(grade.word_count_actual(), 52);
    }

    #[tokio::test]
    async fn test_length_failure_fails_grade() {
        let gateway = Arc::new(MockGateway::replying(&["1. PASS"]));
        let agent = LlmGraderAgent::new(gateway, ModelTier::Fast);
        let rubric =
            Rubric::new(vec!["Clear".into()]).with_word_target(Some(WordTarget::exact(100)));

        let grade = agent.grade(&words(20), &rubric).await.unwrap();
        assert!(!grade.passed());
        assert!(!grade.word_count_ok());
    }

    #[tokio::test]
    async fn test_omitted_criterion_fails() {
        let gateway = Arc::new(MockGateway::replying(&["1. PASS - fine"]));
        let agent = LlmGraderAgent::new(gateway, ModelTier::Fast);
        let rubric = Rubric::new(vec!["Clear".into(), "Cites sources".into()]);

        let grade = agent.grade("some text", &rubric).await.unwrap();
        assert!(!grade.passed());
        let failed: Vec<_> = grade.failed_criteria().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].verdict, Verdict::Fail);
        assert_eq!(failed[0].note, MISSING_VERDICT_NOTE);
    }

    #[tokio::test]
    async fn test_no_criteria_skips_model() {
        let gateway = Arc::new(MockGateway::replying(&[]));
        let agent = LlmGraderAgent::new(gateway.clone(), ModelTier::Fast);
        let rubric = Rubric::default().with_word_target(Some(WordTarget::exact(10)));

        let grade = agent.grade(&words(10), &rubric).await.unwrap();
        assert!(grade.passed());
        assert_eq!(gateway.call_count(), 0);
    }
}
