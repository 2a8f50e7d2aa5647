//! Model configuration from TOML (`[models]` section)

use draftsmith_domain::{AgentModels, AgentRole, ConfigIssue, ConfigIssueCode, ModelTier};
use serde::{Deserialize, Serialize};

pub const DEFAULT_FAST_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CAPABLE_MODEL: &str = "gemini-2.5-pro";

/// Model names per tier and tier per agent role
///
/// # Example
///
/// ```toml
/// [models]
/// fast = "gemini-2.5-flash"
/// capable = "gemini-2.5-pro"
/// grader = "fast"        # criteria / generation / grader / refiner
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Model name used for the fast tier
    pub fast: String,
    /// Model name used for the capable tier
    pub capable: String,
    pub criteria: Option<String>,
    pub generation: Option<String>,
    pub grader: Option<String>,
    pub refiner: Option<String>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST_MODEL.to_string(),
            capable: DEFAULT_CAPABLE_MODEL.to_string(),
            criteria: None,
            generation: None,
            grader: None,
            refiner: None,
        }
    }
}

impl FileModelsConfig {
    /// Parse a role's tier, falling back to the role default on unknown names.
    fn parse_tier(
        role: AgentRole,
        value: Option<&String>,
        default: ModelTier,
    ) -> (ModelTier, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        match value {
            None => (default, issues),
            Some(s) => match s.parse::<ModelTier>() {
                Ok(tier) => (tier, issues),
                Err(_) => {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::UnknownModelTier,
                        format!(
                            "models.{}: unknown tier '{}', falling back to '{}'",
                            role, s, default
                        ),
                    ));
                    (default, issues)
                }
            },
        }
    }

    /// Resolve the tier for every agent role
    pub fn parse_agent_models(&self) -> (AgentModels, Vec<ConfigIssue>) {
        let defaults = AgentModels::default();
        let mut issues = Vec::new();

        let (criteria, i) = Self::parse_tier(
            AgentRole::Criteria,
            self.criteria.as_ref(),
            defaults.criteria,
        );
        issues.extend(i);
        let (generation, i) = Self::parse_tier(
            AgentRole::Generation,
            self.generation.as_ref(),
            defaults.generation,
        );
        issues.extend(i);
        let (grader, i) =
            Self::parse_tier(AgentRole::Grader, self.grader.as_ref(), defaults.grader);
        issues.extend(i);
        let (refiner, i) =
            Self::parse_tier(AgentRole::Refiner, self.refiner.as_ref(), defaults.refiner);
        issues.extend(i);

        let models = AgentModels {
            criteria,
            generation,
            grader,
            refiner,
        };
        (models, issues)
    }

    /// Report empty model names
    pub fn validate_names(&self) -> Vec<ConfigIssue> {
        [("fast", &self.fast), ("capable", &self.capable)]
            .into_iter()
            .filter(|(_, name)| name.trim().is_empty())
            .map(|(field, _)| {
                ConfigIssue::error(
                    ConfigIssueCode::EmptyModelName,
                    format!("models.{}: model name cannot be empty", field),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FileModelsConfig::default();
        let (models, issues) = config.parse_agent_models();
        assert!(issues.is_empty());
        assert_eq!(models, AgentModels::default());
        assert_eq!(config.fast, "gemini-2.5-flash");
        assert_eq!(config.capable, "gemini-2.5-pro");
    }

    #[test]
    fn test_role_override_and_unknown_tier() {
        let config = FileModelsConfig {
            grader: Some("capable".to_string()),
            refiner: Some("turbo".to_string()),
            ..Default::default()
        };
        let (models, issues) = config.parse_agent_models();
        assert_eq!(models.grader, ModelTier::Capable);
        assert_eq!(models.refiner, ModelTier::Capable);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, ConfigIssueCode::UnknownModelTier);
        assert!(issues[0].message.contains("models.refiner"));
    }

    #[test]
    fn test_empty_model_name() {
        let config = FileModelsConfig {
            fast: "  ".to_string(),
            ..Default::default()
        };
        let issues = config.validate_names();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
    }
}
