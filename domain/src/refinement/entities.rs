//! Refinement run state

use crate::conversation::entities::{MessageMetadata, MessageStatus};
use crate::quality::grade::GradeResult;
use crate::quality::rubric::Rubric;
use serde::{Deserialize, Serialize};

/// Smallest accepted iteration cap
pub const MIN_ITERATIONS: usize = 1;
/// Largest accepted iteration cap
pub const MAX_ITERATIONS: usize = 5;
/// Iteration cap used when none is configured
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// Clamp a requested iteration cap into the supported range
pub fn clamp_iterations(requested: usize) -> usize {
    requested.clamp(MIN_ITERATIONS, MAX_ITERATIONS)
}

/// State of the refinement state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefinementPhase {
    Init,
    Criteria,
    Generate,
    Grade,
    Refine,
    Passed,
    Exhausted,
    Failed,
}

impl RefinementPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefinementPhase::Init => "init",
            RefinementPhase::Criteria => "criteria",
            RefinementPhase::Generate => "generate",
            RefinementPhase::Grade => "grade",
            RefinementPhase::Refine => "refine",
            RefinementPhase::Passed => "passed",
            RefinementPhase::Exhausted => "exhausted",
            RefinementPhase::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RefinementPhase::Init => "Starting",
            RefinementPhase::Criteria => "Building criteria",
            RefinementPhase::Generate => "Drafting",
            RefinementPhase::Grade => "Grading",
            RefinementPhase::Refine => "Refining",
            RefinementPhase::Passed => "Passed",
            RefinementPhase::Exhausted => "Exhausted",
            RefinementPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RefinementPhase::Passed | RefinementPhase::Exhausted | RefinementPhase::Failed
        )
    }
}

impl std::fmt::Display for RefinementPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Terminal outcome of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Passed,
    Exhausted,
    /// No usable draft; never appears in a [`RefinementReport`]
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Passed => "passed",
            RunOutcome::Exhausted => "exhausted",
            RunOutcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a run stopped early while keeping an earlier draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The refiner call failed
    RefineFailed(String),
    /// The grader call failed
    GradeFailed(String),
    /// The caller cancelled between two steps
    Cancelled,
}

impl FallbackReason {
    /// User-facing explanation stored with the message
    pub fn notice(&self) -> String {
        match self {
            FallbackReason::RefineFailed(err) => {
                format!("Refinement could not complete ({err}); showing the last graded draft.")
            }
            FallbackReason::GradeFailed(err) => {
                format!("Grading could not complete ({err}); the draft was not fully checked.")
            }
            FallbackReason::Cancelled => {
                "Run cancelled; showing the last graded draft.".to_string()
            }
        }
    }
}

/// One orchestrator invocation (Entity)
///
/// Lives only for the duration of a run and is folded into a
/// [`RefinementReport`] at the end.
#[derive(Debug, Clone)]
pub struct RefinementRun {
    max_iterations: usize,
    phase: RefinementPhase,
    rubric: Option<Rubric>,
    draft: Option<String>,
    grades: Vec<GradeResult>,
    last_graded_draft: Option<String>,
}

impl RefinementRun {
    /// Start a run; `max_iterations` is clamped into 1..=5
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: clamp_iterations(max_iterations),
            phase: RefinementPhase::Init,
            rubric: None,
            draft: None,
            grades: Vec::new(),
            last_graded_draft: None,
        }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn phase(&self) -> RefinementPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: RefinementPhase) {
        self.phase = phase;
    }

    pub fn rubric(&self) -> Option<&Rubric> {
        self.rubric.as_ref()
    }

    pub fn set_rubric(&mut self, rubric: Rubric) {
        self.rubric = Some(rubric);
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    /// Replace the current (not yet graded) draft
    pub fn set_draft(&mut self, draft: String) {
        self.draft = Some(draft);
    }

    /// Number of grading rounds completed so far
    pub fn iteration(&self) -> usize {
        self.grades.len()
    }

    pub fn grades(&self) -> &[GradeResult] {
        &self.grades
    }

    pub fn last_grade(&self) -> Option<&GradeResult> {
        self.grades.last()
    }

    pub fn last_graded_draft(&self) -> Option<&str> {
        self.last_graded_draft.as_deref()
    }

    /// Record the grade of the current draft
    pub fn record_grade(&mut self, grade: GradeResult) {
        self.last_graded_draft = self.draft.clone();
        self.grades.push(grade);
    }

    /// No grading rounds left
    pub fn budget_exhausted(&self) -> bool {
        self.grades.len() >= self.max_iterations
    }

    /// The current draft passed its latest grade
    pub fn passed(&self) -> bool {
        self.last_grade().is_some_and(|g| g.passed())
    }

    /// Finish without quality checks (bypass mode)
    pub fn finish_unchecked(self) -> RefinementReport {
        RefinementReport {
            outcome: RunOutcome::Passed,
            status: MessageStatus::Complete,
            draft: self.draft.unwrap_or_default(),
            rubric: None,
            grades: Vec::new(),
            iterations: 0,
            notice: None,
        }
    }

    /// Finish after the latest grade decided the run
    ///
    /// Passed when the last grade passed, otherwise exhausted by the cap.
    /// Only meaningful after at least one [`record_grade`](Self::record_grade).
    pub fn finish_graded(mut self) -> RefinementReport {
        let passed = self.passed();
        let draft = self.last_graded_draft.take().unwrap_or_default();
        let (outcome, status, notice) = if passed {
            (RunOutcome::Passed, MessageStatus::Complete, None)
        } else {
            (
                RunOutcome::Exhausted,
                MessageStatus::MaxIterationsExhausted,
                Some(format!(
                    "Maximum refinement iterations ({}) reached without passing every check.",
                    self.max_iterations
                )),
            )
        };
        self.into_report(outcome, status, draft, notice)
    }

    /// Finish early, keeping the best draft available for `reason`.
    ///
    /// Refine failures and cancellation fall back to the last graded
    /// draft. A grade failure keeps the current draft, which is the newest
    /// text even though its grade is missing. Returns `None` when there is
    /// nothing to keep.
    pub fn finish_with_fallback(mut self, reason: FallbackReason) -> Option<RefinementReport> {
        let draft = match reason {
            FallbackReason::GradeFailed(_) => self.draft.take(),
            _ => self.last_graded_draft.take(),
        }?;
        let notice = Some(reason.notice());
        Some(self.into_report(
            RunOutcome::Exhausted,
            MessageStatus::PartialFailure,
            draft,
            notice,
        ))
    }

    fn into_report(
        self,
        outcome: RunOutcome,
        status: MessageStatus,
        draft: String,
        notice: Option<String>,
    ) -> RefinementReport {
        RefinementReport {
            outcome,
            status,
            draft,
            iterations: self.grades.len(),
            rubric: self.rubric,
            grades: self.grades,
            notice,
        }
    }
}

/// Result of a run that produced a committable draft (Value Object)
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementReport {
    pub outcome: RunOutcome,
    pub status: MessageStatus,
    /// Text to commit as the assistant message
    pub draft: String,
    pub rubric: Option<Rubric>,
    pub grades: Vec<GradeResult>,
    /// Grading rounds performed
    pub iterations: usize,
    pub notice: Option<String>,
}

impl RefinementReport {
    /// Metadata for the committed message
    pub fn metadata(&self, warnings: Vec<String>) -> MessageMetadata {
        MessageMetadata {
            rubric: self.rubric.clone(),
            grades: self.grades.clone(),
            iterations: self.iterations,
            warnings,
            notice: self.notice.clone(),
        }
    }
}
