//! Refinement loop configuration from TOML (`[refinement]` section)

use draftsmith_application::RefinementParams;
use draftsmith_domain::{
    ConfigIssue, ConfigIssueCode, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE, MAX_ITERATIONS,
    MIN_ITERATIONS, clamp_iterations,
};
use serde::{Deserialize, Serialize};

/// Raw refinement configuration from TOML
///
/// # Example
///
/// ```toml
/// [refinement]
/// max_iterations = 3
/// word_count_tolerance = 0.10
/// quality_agents_enabled = true
/// search_enabled = true
/// code_execution_enabled = false
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRefinementConfig {
    /// Maximum grading rounds per turn (1-5)
    pub max_iterations: usize,
    /// Relative tolerance around a detected word target
    pub word_count_tolerance: f64,
    /// Run the criteria/grader/refiner agents
    pub quality_agents_enabled: bool,
    /// Let the generation agent use search grounding
    pub search_enabled: bool,
    /// Let the generation agent run code
    pub code_execution_enabled: bool,
}

impl Default for FileRefinementConfig {
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

impl FileRefinementConfig {
    /// Convert to runtime parameters, collecting issues.
    ///
    /// An out-of-range iteration cap is clamped with a warning. An invalid
    /// tolerance is an error; the default tolerance is used in its place.
    pub fn to_params(&self) -> (RefinementParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.max_iterations) {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::IterationsOutOfRange,
                format!(
                    "refinement.max_iterations: {} is outside {}-{}, using {}",
                    self.max_iterations,
                    MIN_ITERATIONS,
                    MAX_ITERATIONS,
                    clamp_iterations(self.max_iterations)
                ),
            ));
        }

        let tolerance = if (0.0..1.0).contains(&self.word_count_tolerance) {
            self.word_count_tolerance
        } else {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidTolerance,
                format!(
                    "refinement.word_count_tolerance: {} must be at least 0 and below 1",
                    self.word_count_tolerance
                ),
            ));
            DEFAULT_TOLERANCE
        };

        let params = RefinementParams::default()
            .with_max_iterations(self.max_iterations)
            .with_word_count_tolerance(tolerance)
            .with_quality_agents(self.quality_agents_enabled)
            .with_search(self.search_enabled)
            .with_code_execution(self.code_execution_enabled);
        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_convert_cleanly() {
        let (params, issues) = FileRefinementConfig::default().to_params();
        assert!(issues.is_empty());
        assert_eq!(params, RefinementParams::default());
    }

    #[test]
    fn test_iterations_clamped_with_warning() {
        let config = FileRefinementConfig {
            max_iterations: 12,
            ..Default::default()
        };
        let (params, issues) = config.to_params();
        assert_eq!(params.max_iterations, 5);
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
        assert_eq!(issues[0].code, ConfigIssueCode::IterationsOutOfRange);
    }

    #[test]
    fn test_invalid_tolerance_is_error() {
        let config = FileRefinementConfig {
            word_count_tolerance: 1.5,
            ..Default::default()
        };
        let (params, issues) = config.to_params();
        assert_eq!(params.word_count_tolerance, DEFAULT_TOLERANCE);
        assert!(issues[0].is_error());
    }
}
