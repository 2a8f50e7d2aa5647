//! Run Refinement use case
//!
//! Drives one user turn through the quality loop:
//!
//! ```text
//! INIT → CRITERIA → GENERATE → GRADE → (REFINE → GRADE)* → PASSED | EXHAUSTED | FAILED
//! ```
//!
//! Agent calls are strictly sequential. Cancellation is checked between
//! transitions, never during an agent call.

use crate::agents::{AgentError, AgentSet};
use crate::config::RefinementParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::ContextEntry;
use crate::ports::progress::{ProgressEvent, ProgressNotifier};
use draftsmith_domain::util::preview;
use draftsmith_domain::{
    Attachment, FallbackReason, RefinementPhase, RefinementReport, RefinementRun, RunOutcome,
    WordCountAnalyzer,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that end a run without a committable draft
#[derive(Error, Debug)]
pub enum RunRefinementError {
    #[error("Refinement run failed: {0}")]
    RunFailed(#[source] AgentError),

    #[error("Run cancelled before any draft was graded")]
    Cancelled,
}

impl RunRefinementError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RunRefinementError::Cancelled)
    }
}

/// Input for one refinement run
#[derive(Debug, Clone)]
pub struct RefinementInput {
    pub prompt: String,
    /// Ancestors of the turn, root first
    pub context: Vec<ContextEntry>,
    pub attachments: Vec<Attachment>,
    pub params: RefinementParams,
}

impl RefinementInput {
    pub fn new(prompt: impl Into<String>, params: RefinementParams) -> Self {
        Self {
            prompt: prompt.into(),
            context: Vec::new(),
            attachments: Vec::new(),
            params,
        }
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

/// The refinement state machine
#[derive(Clone)]
pub struct RefinementOrchestrator {
    agents: AgentSet,
    analyzer: WordCountAnalyzer,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl RefinementOrchestrator {
    pub fn new(agents: AgentSet) -> Self {
        Self {
            agents,
            analyzer: WordCountAnalyzer::new(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    /// Run the loop for one turn.
    ///
    /// Returns a report for every run that produced a usable draft, even a
    /// partial one. Only a failure before the first draft, or cancellation
    /// before the first grade, is an error.
    pub async fn execute(
        &self,
        input: RefinementInput,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Result<RefinementReport, RunRefinementError> {
        let params = input.params;
        let mut run = RefinementRun::new(params.max_iterations);

        info!(
            max_iterations = run.max_iterations(),
            quality_agents = params.quality_agents_enabled,
            "Starting refinement: {}",
            preview(&input.prompt, 100)
        );
        self.enter(&mut run, RefinementPhase::Init, progress);

        if cancel.is_cancelled() {
            return self.cancelled(run, progress);
        }

        if !params.quality_agents_enabled {
            return self.execute_unchecked(&input, run, progress).await;
        }

        // CRITERIA
        self.enter(&mut run, RefinementPhase::Criteria, progress);
        let rubric = match self
            .agents
            .criteria
            .build_rubric(&input.prompt, &input.attachments, params.word_count_tolerance)
            .await
        {
            Ok(rubric) => rubric,
            Err(e) => return Err(self.failed(run, e, progress)),
        };
        self.log(
            "criteria_ready",
            json!({
                "criteria": rubric.criteria,
                "word_target": rubric.word_target,
                "tolerance": rubric.tolerance,
            }),
        );
        progress.on_event(&ProgressEvent::CriteriaReady {
            rubric: rubric.clone(),
        });
        run.set_rubric(rubric.clone());

        if cancel.is_cancelled() {
            return self.cancelled(run, progress);
        }

        // GENERATE
        self.enter(&mut run, RefinementPhase::Generate, progress);
        let draft = match self
            .agents
            .generation
            .generate_draft(
                &input.prompt,
                &input.context,
                &input.attachments,
                params.draft_tools(),
            )
            .await
        {
            Ok(draft) => draft,
            Err(e) => return Err(self.failed(run, e, progress)),
        };
        let words = self.analyzer.count_words(&draft);
        self.log("draft_ready", json!({ "words": words, "text": draft }));
        progress.on_event(&ProgressEvent::DraftReady { words });
        run.set_draft(draft);

        loop {
            if cancel.is_cancelled() {
                return self.cancelled(run, progress);
            }

            // GRADE
            self.enter(&mut run, RefinementPhase::Grade, progress);
            let draft = run.draft().unwrap_or_default().to_string();
            let grade = match self.agents.grader.grade(&draft, &rubric).await {
                Ok(grade) => grade,
                Err(e) => {
                    warn!(iteration = run.iteration() + 1, "Grading failed: {}", e);
                    let reason = FallbackReason::GradeFailed(e.to_string());
                    return match run.finish_with_fallback(reason) {
                        Some(report) => Ok(self.complete(report, progress)),
                        None => Err(RunRefinementError::RunFailed(e)),
                    };
                }
            };
            run.record_grade(grade.clone());
            let iteration = run.iteration();
            debug!(
                iteration,
                passed = grade.passed(),
                words = grade.word_count_actual(),
                "Draft graded"
            );
            self.log(
                "grade_result",
                json!({ "iteration": iteration, "grade": grade }),
            );
            progress.on_event(&ProgressEvent::GradeResult {
                iteration,
                grade: grade.clone(),
            });

            if run.passed() || run.budget_exhausted() {
                let report = run.finish_graded();
                return Ok(self.complete(report, progress));
            }

            if cancel.is_cancelled() {
                return self.cancelled(run, progress);
            }

            // REFINE
            self.enter(&mut run, RefinementPhase::Refine, progress);
            let refined = self
                .agents
                .refiner
                .refine(&input.prompt, &draft, &grade, &rubric)
                .await;
            match refined {
                Ok(revised) => {
                    let words = self.analyzer.count_words(&revised);
                    self.log(
                        "refine_applied",
                        json!({ "iteration": iteration, "words": words, "text": revised }),
                    );
                    progress.on_event(&ProgressEvent::RefineApplied { iteration, words });
                    run.set_draft(revised);
                }
                Err(e) => {
                    warn!(iteration, "Refinement failed, keeping last graded draft: {}", e);
                    let reason = FallbackReason::RefineFailed(e.to_string());
                    return match run.finish_with_fallback(reason) {
                        Some(report) => Ok(self.complete(report, progress)),
                        None => Err(RunRefinementError::RunFailed(e)),
                    };
                }
            }
        }
    }

    /// Bypass mode: one generation call, no grading
    async fn execute_unchecked(
        &self,
        input: &RefinementInput,
        mut run: RefinementRun,
        progress: &dyn ProgressNotifier,
    ) -> Result<RefinementReport, RunRefinementError> {
        self.enter(&mut run, RefinementPhase::Generate, progress);
        let draft = match self
            .agents
            .generation
            .generate_draft(
                &input.prompt,
                &input.context,
                &input.attachments,
                input.params.draft_tools(),
            )
            .await
        {
            Ok(draft) => draft,
            Err(e) => return Err(self.failed(run, e, progress)),
        };

        let words = self.analyzer.count_words(&draft);
        self.log("draft_ready", json!({ "words": words, "text": draft }));
        progress.on_event(&ProgressEvent::DraftReady { words });
        run.set_draft(draft);

        Ok(self.complete(run.finish_unchecked(), progress))
    }

    fn enter(&self, run: &mut RefinementRun, phase: RefinementPhase, progress: &dyn ProgressNotifier) {
        run.set_phase(phase);
        progress.on_event(&ProgressEvent::PhaseEntered { phase });
    }

    fn complete(&self, report: RefinementReport, progress: &dyn ProgressNotifier) -> RefinementReport {
        let phase = match report.outcome {
            RunOutcome::Passed => RefinementPhase::Passed,
            _ => RefinementPhase::Exhausted,
        };
        progress.on_event(&ProgressEvent::PhaseEntered { phase });

        info!(
            outcome = %report.outcome,
            status = %report.status,
            iterations = report.iterations,
            "Refinement complete"
        );
        self.log(
            "run_complete",
            json!({
                "outcome": report.outcome,
                "status": report.status,
                "iterations": report.iterations,
                "notice": report.notice,
            }),
        );
        progress.on_event(&ProgressEvent::RunComplete {
            outcome: report.outcome,
            status: Some(report.status),
            iterations: report.iterations,
        });
        report
    }

    fn failed(
        &self,
        mut run: RefinementRun,
        error: AgentError,
        progress: &dyn ProgressNotifier,
    ) -> RunRefinementError {
        warn!(phase = run.phase().as_str(), "Refinement failed: {}", error);
        self.enter(&mut run, RefinementPhase::Failed, progress);
        self.log(
            "run_complete",
            json!({
                "outcome": RunOutcome::Failed,
                "error": error.to_string(),
                "iterations": run.iteration(),
            }),
        );
        progress.on_event(&ProgressEvent::RunComplete {
            outcome: RunOutcome::Failed,
            status: None,
            iterations: run.iteration(),
        });
        RunRefinementError::RunFailed(error)
    }

    /// Keep the last graded draft, or give up if nothing was graded yet
    fn cancelled(
        &self,
        run: RefinementRun,
        progress: &dyn ProgressNotifier,
    ) -> Result<RefinementReport, RunRefinementError> {
        info!(iteration = run.iteration(), "Refinement cancelled");
        let iterations = run.iteration();
        match run.finish_with_fallback(FallbackReason::Cancelled) {
            Some(report) => Ok(self.complete(report, progress)),
            None => {
                progress.on_event(&ProgressEvent::PhaseEntered {
                    phase: RefinementPhase::Failed,
                });
                progress.on_event(&ProgressEvent::RunComplete {
                    outcome: RunOutcome::Failed,
                    status: None,
                    iterations,
                });
                Err(RunRefinementError::Cancelled)
            }
        }
    }

    fn log(&self, event_type: &'static str, payload: serde_json::Value) {
        self.conversation_logger
            .log(ConversationEvent::new(event_type, payload));
    }
}
