//! Model tier value object

use serde::{Deserialize, Serialize};

/// Capability tier requested from the generation backend (Value Object)
///
/// The core never names concrete models. Each agent role asks for a tier
/// and the gateway adapter maps it onto whatever model the deployment
/// configured for that tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Cheap, low-latency model
    Fast,
    /// Higher-quality, slower model
    #[default]
    Capable,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Fast => "fast",
            ModelTier::Capable => "capable",
        }
    }
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" | "flash" => Ok(ModelTier::Fast),
            "capable" | "pro" => Ok(ModelTier::Capable),
            other => Err(format!("unknown model tier '{}'", other)),
        }
    }
}
