//! Prompt domain
//!
//! Templates for the prompts sent at each step of the refinement loop.

mod template;

pub use template::PromptTemplate;
