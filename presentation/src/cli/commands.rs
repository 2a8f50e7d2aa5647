//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for a finished turn
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Answer plus status, rubric, grade history and statistics
    Full,
    /// Only the answer text
    Answer,
    /// JSON output
    Json,
}

impl From<OutputFormat> for draftsmith_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => draftsmith_domain::OutputFormat::Full,
            OutputFormat::Answer => draftsmith_domain::OutputFormat::Answer,
            OutputFormat::Json => draftsmith_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for draftsmith
#[derive(Parser, Debug)]
#[command(name = "draftsmith")]
#[command(author, version, about = "Draft, grade and refine LLM answers until they pass")]
#[command(long_about = r#"
draftsmith answers a prompt with a multi-agent refinement loop:

1. Criteria:  a rubric of checkable criteria is built from the prompt
2. Generate:  a first draft is written (optionally with web search and
              code execution)
3. Grade:     every criterion is judged and the word count is checked
4. Refine:    failed checks are fed back until the draft passes or the
              iteration cap is reached

Chat mode keeps a branching conversation: edit any earlier prompt with
/edit and the original branch stays available through /branches.

Configuration files are loaded from (in priority order):
1. DRAFTSMITH_* environment variables (e.g. DRAFTSMITH_REFINEMENT__MAX_ITERATIONS=5)
2. --config <path>      Explicit config file
3. ./draftsmith.toml    Project-level config
4. ~/.config/draftsmith/config.toml   Global config

Example:
  draftsmith "Write a 200-300 word summary of how tides work"
  draftsmith -f notes.md --output full "Summarize the attached notes in 150 words"
  draftsmith --chat --max-iterations 5
"#)]
pub struct Cli {
    /// The prompt to answer (not required in chat mode)
    pub prompt: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Attach a text file as context (can be specified multiple times)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Maximum grading rounds per turn (1-5)
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Skip the criteria, grader and refiner agents
    #[arg(long)]
    pub no_agents: bool,

    /// Disable search grounding for the first draft
    #[arg(long)]
    pub no_search: bool,

    /// Let the model run code while writing the first draft
    #[arg(long)]
    pub code_execution: bool,

    /// Output format (defaults to [output] format, then "answer")
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Write rolling diagnostic logs to this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
