//! Grading results.

use serde::{Deserialize, Serialize};

/// Outcome for a single criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Grader feedback on one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionFeedback {
    pub criterion: String,
    pub verdict: Verdict,
    pub note: String,
}

impl CriterionFeedback {
    pub fn new(criterion: impl Into<String>, verdict: Verdict, note: impl Into<String>) -> Self {
        Self {
            criterion: criterion.into(),
            verdict,
            note: note.into(),
        }
    }
}

/// Result of grading one draft (Value Object)
///
/// `passed` is derived from the other fields on construction and cannot
/// disagree with them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    passed: bool,
    criteria_feedback: Vec<CriterionFeedback>,
    word_count_actual: usize,
    word_count_ok: bool,
}

impl GradeResult {
    pub fn new(
        criteria_feedback: Vec<CriterionFeedback>,
        word_count_actual: usize,
        word_count_ok: bool,
    ) -> Self {
        let passed = word_count_ok && criteria_feedback.iter().all(|f| f.verdict.is_pass());
        Self {
            passed,
            criteria_feedback,
            word_count_actual,
            word_count_ok,
        }
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn criteria_feedback(&self) -> &[CriterionFeedback] {
        &self.criteria_feedback
    }

    pub fn word_count_actual(&self) -> usize {
        self.word_count_actual
    }

    pub fn word_count_ok(&self) -> bool {
        self.word_count_ok
    }

    pub fn failed_criteria(&self) -> impl Iterator<Item = &CriterionFeedback> {
        self.criteria_feedback
            .iter()
            .filter(|f| !f.verdict.is_pass())
    }

    pub fn passed_count(&self) -> usize {
        self.criteria_feedback
            .iter()
            .filter(|f| f.verdict.is_pass())
            .count()
    }
}
