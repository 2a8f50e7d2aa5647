//! Configuration issues.
//!
//! Loaders report problems as structured [`ConfigIssue`]s instead of failing
//! on the first one, so every problem can be shown to the user at once.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: a fallback value is used instead.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// `max_iterations` outside 1..=5; the value is clamped.
    IterationsOutOfRange,
    /// `word_count_tolerance` outside [0, 1).
    InvalidTolerance,
    /// A per-role tier is not `fast` or `capable`; the role default is used.
    UnknownModelTier,
    /// A model name is empty.
    EmptyModelName,
    /// The provider timeout is zero.
    InvalidTimeout,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        let issue = ConfigIssue::error(ConfigIssueCode::InvalidTolerance, "bad");
        assert!(issue.is_error());
        assert_eq!(issue.to_string(), "error: bad");

        let issue = ConfigIssue::warning(ConfigIssueCode::UnknownModelTier, "meh");
        assert!(!issue.is_error());
        assert_eq!(issue.code, ConfigIssueCode::UnknownModelTier);
    }
}
