//! Configuration file loading for draftsmith
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `DRAFTSMITH_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./draftsmith.toml` or `./.draftsmith.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/draftsmith/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_CAPABLE_MODEL,
    DEFAULT_FAST_MODEL, FileConfig, FileLoggingConfig, FileModelsConfig, FileOutputConfig,
    FileOutputFormat, FileProviderConfig, FileRefinementConfig, FileReplConfig,
};
pub use loader::ConfigLoader;
