//! Message identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a message in a conversation thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    /// Creates a new random message ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, enough to address a message interactively
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Whether the textual form of this id starts with `prefix`
    ///
    /// Both the hyphenated and the simple form are accepted.
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        let prefix = prefix.trim().to_lowercase();
        !prefix.is_empty()
            && (self.0.hyphenated().to_string().starts_with(&prefix)
                || self.0.simple().to_string().starts_with(&prefix))
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(MessageId::new(), MessageId::new());
    }

    #[test]
    fn test_short_form() {
        let id = MessageId::new();
        let short = id.short();
        assert_eq!(short.len(), 8);
        assert!(id.matches_prefix(&short));
    }

    #[test]
    fn test_prefix_rejects_empty_and_foreign() {
        let id = MessageId::new();
        assert!(!id.matches_prefix(""));
        assert!(!id.matches_prefix("zzzz"));
    }

    #[test]
    fn test_parse_display_roundtrip() {
        let id = MessageId::new();
        let parsed: MessageId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
