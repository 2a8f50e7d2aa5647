//! Interactive chat module
//!
//! Provides a readline-based chat over one branching conversation.

mod repl;

pub use repl::{ChatRepl, ReplCommand};
