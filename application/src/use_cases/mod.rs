//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod load_attachments;
pub mod run_refinement;
pub mod submit_turn;
