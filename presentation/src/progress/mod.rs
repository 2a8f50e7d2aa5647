//! Progress reporting for refinement runs

pub mod reporter;
