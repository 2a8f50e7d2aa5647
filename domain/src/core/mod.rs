//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelTier`]: capability tier an agent asks the backend for
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod model;
