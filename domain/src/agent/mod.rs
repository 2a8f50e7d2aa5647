//! Agent roles and their model tiers.

pub mod model_config;

pub use model_config::{AgentModels, AgentRole};
