//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Where log files go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// Directory for rolling diagnostic logs; none disables file logging
    pub dir: Option<String>,
    /// JSONL transcript path; none disables the transcript
    pub conversation_log: Option<String>,
}
