//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod logging;
mod models;
mod output;
mod provider;
mod refinement;
mod repl;

pub use logging::FileLoggingConfig;
pub use models::{DEFAULT_CAPABLE_MODEL, DEFAULT_FAST_MODEL, FileModelsConfig};
pub use output::{FileOutputConfig, FileOutputFormat};
pub use provider::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, FileProviderConfig};
pub use refinement::FileRefinementConfig;
pub use repl::FileReplConfig;

use draftsmith_domain::ConfigIssue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration that cannot be used
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("invalid configuration:\n{}", format_issues(.0))]
    Invalid(Vec<ConfigIssue>),
}

fn format_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {}", issue))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Refinement loop settings
    pub refinement: FileRefinementConfig,
    /// Tier model names and per-role tiers
    pub models: FileModelsConfig,
    /// Generation backend
    pub provider: FileProviderConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Log file locations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.refinement.to_params().1);
        issues.extend(self.models.parse_agent_models().1);
        issues.extend(self.models.validate_names());
        issues.extend(self.provider.validate());
        issues
    }

    /// Fail on errors; return the remaining warnings.
    pub fn ensure_valid(&self) -> Result<Vec<ConfigIssue>, ConfigValidationError> {
        let (errors, warnings): (Vec<_>, Vec<_>) =
            self.validate().into_iter().partition(|i| i.is_error());
        if errors.is_empty() {
            Ok(warnings)
        } else {
            Err(ConfigValidationError::Invalid(errors))
        }
    }
}
