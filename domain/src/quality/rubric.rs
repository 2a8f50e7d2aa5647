//! Quality rubric for one user turn.

use super::word_count::{DEFAULT_TOLERANCE, WordTarget};
use serde::{Deserialize, Serialize};

/// Criteria a draft is graded against (Value Object)
///
/// Built once per user turn and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rubric {
    /// Qualitative criteria, in the order the model proposed them
    pub criteria: Vec<String>,
    /// Length requirement detected in the prompt
    pub word_target: Option<WordTarget>,
    /// Relative tolerance applied to `word_target`
    pub tolerance: f64,
}

impl Default for Rubric {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            word_target: None,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl Rubric {
    pub fn new(criteria: Vec<String>) -> Self {
        Self {
            criteria,
            ..Default::default()
        }
    }

    pub fn with_word_target(mut self, target: Option<WordTarget>) -> Self {
        self.word_target = target;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn has_criteria(&self) -> bool {
        !self.criteria.is_empty()
    }

    /// Criteria as a numbered list, the format graders are asked to echo
    pub fn numbered_criteria(&self) -> String {
        self.criteria
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{}. {}", i + 1, c))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Human-readable length requirement, e.g. "200-300 words (±10%)"
    pub fn word_requirement(&self) -> Option<String> {
        self.word_target.map(|target| {
            format!("{} (±{:.0}%)", target, self.tolerance * 100.0)
        })
    }
}
