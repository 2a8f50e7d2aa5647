//! Refinement loop state.

pub mod entities;

pub use entities::{
    DEFAULT_MAX_ITERATIONS, FallbackReason, MAX_ITERATIONS, MIN_ITERATIONS, RefinementPhase,
    RefinementReport, RefinementRun, RunOutcome, clamp_iterations,
};
