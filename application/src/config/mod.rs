//! Application-level configuration.
//!
//! - [`RefinementParams`]: refinement loop control (iterations, tolerance, agent toggles)

pub mod refinement_params;

pub use refinement_params::RefinementParams;
