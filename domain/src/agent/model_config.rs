//! Role-based model tier configuration.
//!
//! [`AgentModels`] records which [`ModelTier`] each refinement agent asks
//! for. It is a static value object: chosen once from configuration and
//! never changed during a run.

use crate::core::model::ModelTier;
use serde::{Deserialize, Serialize};

/// The four agent roles in the refinement loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Builds the quality rubric for a user turn
    Criteria,
    /// Writes the first draft
    Generation,
    /// Judges a draft against the rubric
    Grader,
    /// Rewrites a draft using grader feedback
    Refiner,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Criteria => "criteria",
            AgentRole::Generation => "generation",
            AgentRole::Grader => "grader",
            AgentRole::Refiner => "refiner",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Model tier per agent role.
///
/// Grading is a short classification task and defaults to the fast tier;
/// everything that writes prose defaults to the capable tier.
///
/// # Example
///
/// ```
/// use draftsmith_domain::{AgentModels, AgentRole, ModelTier};
///
/// let models = AgentModels::default().with_grader(ModelTier::Capable);
/// assert_eq!(models.tier_for(AgentRole::Grader), ModelTier::Capable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentModels {
    pub criteria: ModelTier,
    pub generation: ModelTier,
    pub grader: ModelTier,
    pub refiner: ModelTier,
}

impl Default for AgentModels {
    fn default() -> Self {
        Self {
            criteria: ModelTier::Capable,
            generation: ModelTier::Capable,
            grader: ModelTier::Fast,
            refiner: ModelTier::Capable,
        }
    }
}

impl AgentModels {
    /// Tier used by the given role
    pub fn tier_for(&self, role: AgentRole) -> ModelTier {
        match role {
            AgentRole::Criteria => self.criteria,
            AgentRole::Generation => self.generation,
            AgentRole::Grader => self.grader,
            AgentRole::Refiner => self.refiner,
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_criteria(mut self, tier: ModelTier) -> Self {
        self.criteria = tier;
        self
    }

    pub fn with_generation(mut self, tier: ModelTier) -> Self {
        self.generation = tier;
        self
    }

    pub fn with_grader(mut self, tier: ModelTier) -> Self {
        self.grader = tier;
        self
    }

    pub fn with_refiner(mut self, tier: ModelTier) -> Self {
        self.refiner = tier;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let models = AgentModels::default();
        assert_eq!(models.criteria, ModelTier::Capable);
        assert_eq!(models.generation, ModelTier::Capable);
        assert_eq!(models.grader, ModelTier::Fast);
        assert_eq!(models.refiner, ModelTier::Capable);
    }

    #[test]
    fn test_builder() {
        let models = AgentModels::default()
            .with_criteria(ModelTier::Fast)
            .with_generation(ModelTier::Fast)
            .with_refiner(ModelTier::Fast);

        assert_eq!(models.tier_for(AgentRole::Criteria), ModelTier::Fast);
        assert_eq!(models.tier_for(AgentRole::Generation), ModelTier::Fast);
        assert_eq!(models.tier_for(AgentRole::Refiner), ModelTier::Fast);
        assert_eq!(models.tier_for(AgentRole::Grader), ModelTier::Fast);
    }

    #[test]
    fn test_role_display() {
        assert_eq!(AgentRole::Grader.to_string(), "grader");
    }
}
