//! Refinement parameters: orchestrator loop control.
//!
//! [`RefinementParams`] groups the settings a single refinement run reads.
//! They are chosen per session (and can be changed between turns from the
//! chat REPL) but never change while a run is in flight.

use crate::agents::DraftTools;
use draftsmith_domain::{DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, clamp_iterations};
use serde::{Deserialize, Serialize};

/// Refinement loop control parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefinementParams {
    /// Maximum grading rounds per turn, always within 1..=5.
    pub max_iterations: usize,
    /// Relative tolerance around a detected word target.
    pub word_count_tolerance: f64,
    /// When false the draft is returned ungraded.
    pub quality_agents_enabled: bool,
    /// Allow the generation agent to use search grounding.
    pub search_enabled: bool,
    /// Allow the generation agent to run code.
    pub code_execution_enabled: bool,
}

impl Default for RefinementParams {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            word_count_tolerance: DEFAULT_TOLERANCE,
            quality_agents_enabled: true,
            search_enabled: true,
            code_execution_enabled: false,
        }
    }
}

impl RefinementParams {
    // ==================== Builder Methods ====================

    /// Set the iteration cap, clamped into 1..=5
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = clamp_iterations(max);
        self
    }

    pub fn with_word_count_tolerance(mut self, tolerance: f64) -> Self {
        self.word_count_tolerance = tolerance;
        self
    }

    pub fn with_quality_agents(mut self, enabled: bool) -> Self {
        self.quality_agents_enabled = enabled;
        self
    }

    pub fn with_search(mut self, enabled: bool) -> Self {
        self.search_enabled = enabled;
        self
    }

    pub fn with_code_execution(mut self, enabled: bool) -> Self {
        self.code_execution_enabled = enabled;
        self
    }

    /// Tools offered to the generation agent
    pub fn draft_tools(&self) -> DraftTools {
        DraftTools {
            search: self.search_enabled,
            code_execution: self.code_execution_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = RefinementParams::default();
        assert_eq!(params.max_iterations, 3);
        assert_eq!(params.word_count_tolerance, 0.10);
        assert!(params.quality_agents_enabled);
        assert!(params.search_enabled);
        assert!(!params.code_execution_enabled);
    }

    #[test]
    fn test_builder_clamps_iterations() {
        assert_eq!(RefinementParams::default().with_max_iterations(0).max_iterations, 1);
        assert_eq!(RefinementParams::default().with_max_iterations(12).max_iterations, 5);

        let params = RefinementParams::default()
            .with_quality_agents(false)
            .with_search(false);
        assert!(!params.quality_agents_enabled);
        assert!(!params.search_enabled);
    }

    #[test]
    fn test_draft_tools_follow_toggles() {
        let tools = RefinementParams::default()
            .with_search(false)
            .with_code_execution(true)
            .draft_tools();
        assert_eq!(
            tools,
            DraftTools {
                search: false,
                code_execution: true
            }
        );
    }
}
