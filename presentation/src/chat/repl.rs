//! REPL (Read-Eval-Print Loop) for interactive chat

use crate::config::{OutputConfig, ReplConfig};
use crate::{ConsoleFormatter, ProgressReporter, SimpleProgress};
use colored::Colorize;
use draftsmith_application::{
    LoadAttachmentsUseCase, ProgressNotifier, SessionContext, SubmitTurnError, SubmitTurnUseCase,
    TurnOutcome, TurnRequest,
};
use draftsmith_domain::util::preview;
use draftsmith_domain::{MAX_ITERATIONS, MIN_ITERATIONS, Message, MessageId, OutputFormat};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const PREVIEW_BYTES: usize = 70;

/// A parsed slash command
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Quit,
    History,
    Edit { index: usize, text: String },
    Branches,
    Switch(String),
    Attach(PathBuf),
    Detach,
    Agents(bool),
    Search(bool),
    Code(bool),
    Iterations(usize),
    Retry,
    Export(PathBuf),
    Clear,
}

impl ReplCommand {
    /// Parse a line starting with '/'
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        match name {
            "/help" | "/h" | "/?" => Ok(ReplCommand::Help),
            "/quit" | "/exit" | "/q" => Ok(ReplCommand::Quit),
            "/history" => Ok(ReplCommand::History),
            "/branches" => Ok(ReplCommand::Branches),
            "/detach" => Ok(ReplCommand::Detach),
            "/retry" => Ok(ReplCommand::Retry),
            "/clear" => Ok(ReplCommand::Clear),
            "/edit" => {
                let (index, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or("usage: /edit <n> <new prompt>")?;
                let index: usize = index
                    .parse()
                    .map_err(|_| format!("/edit: '{}' is not a message number", index))?;
                if index == 0 {
                    return Err("/edit: message numbers start at 1".to_string());
                }
                Ok(ReplCommand::Edit {
                    index,
                    text: text.trim().to_string(),
                })
            }
            "/switch" if !rest.is_empty() => Ok(ReplCommand::Switch(rest.to_string())),
            "/switch" => Err("usage: /switch <id-prefix>".to_string()),
            "/attach" if !rest.is_empty() => Ok(ReplCommand::Attach(PathBuf::from(rest))),
            "/attach" => Err("usage: /attach <path>".to_string()),
            "/export" if !rest.is_empty() => Ok(ReplCommand::Export(PathBuf::from(rest))),
            "/export" => Err("usage: /export <path>".to_string()),
            "/agents" => parse_toggle(rest).map(ReplCommand::Agents),
            "/search" => parse_toggle(rest).map(ReplCommand::Search),
            "/code" => parse_toggle(rest).map(ReplCommand::Code),
            "/iterations" => {
                let n: usize = rest
                    .parse()
                    .map_err(|_| "usage: /iterations <1-5>".to_string())?;
                if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&n) {
                    return Err(format!(
                        "/iterations: must be between {} and {}",
                        MIN_ITERATIONS, MAX_ITERATIONS
                    ));
                }
                Ok(ReplCommand::Iterations(n))
            }
            other => Err(format!(
                "Unknown command: {}\nType /help for available commands",
                other
            )),
        }
    }
}

fn parse_toggle(value: &str) -> Result<bool, String> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err("expected 'on' or 'off'".to_string()),
    }
}

/// Interactive chat REPL
pub struct ChatRepl {
    submit: SubmitTurnUseCase,
    attachments: LoadAttachmentsUseCase,
    session: SessionContext,
    pending_files: Vec<PathBuf>,
    output: OutputConfig,
    repl: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl
    pub fn new(
        submit: SubmitTurnUseCase,
        attachments: LoadAttachmentsUseCase,
        session: SessionContext,
    ) -> Self {
        Self {
            submit,
            attachments,
            session,
            pending_files: Vec::new(),
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
        }
    }

    // ==================== Builder Methods ====================

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    /// Files attached to every following turn until /detach
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.pending_files = files;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.repl.history_path();
        if let Some(ref path) = history_path {
            prepare_history_dir(path);
            // A missing file on first run is expected
            if let Err(e) = rl.load_history(path) {
                debug!("History not loaded from {}: {}", path.display(), e);
            }
        }

        self.print_welcome();

        loop {
            let readline = rl.readline(">>> ");

            match readline {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    if line.starts_with('/') {
                        match ReplCommand::parse(line) {
                            Ok(ReplCommand::Quit) => {
                                println!("Bye!");
                                break;
                            }
                            Ok(command) => self.handle_command(command).await,
                            Err(message) => println!("{}", message),
                        }
                        continue;
                    }

                    self.process_prompt(line).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            if let Err(e) = rl.save_history(path) {
                warn!("Could not save history to {}: {}", path.display(), e);
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│            draftsmith - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        self.print_settings();
        println!("Type /help for commands. Ctrl-C cancels a running turn.");
        println!();
    }

    fn print_settings(&self) {
        let settings = &self.session.settings;
        println!(
            "Agents: {}  Search: {}  Code: {}  Iterations: {}",
            on_off(settings.quality_agents_enabled),
            on_off(settings.search_enabled),
            on_off(settings.code_execution_enabled),
            settings.max_iterations
        );
        if !self.pending_files.is_empty() {
            let names: Vec<String> = self
                .pending_files
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            println!("Attached: {}", names.join(", "));
        }
    }

    fn print_help() {
        println!();
        println!("Commands:");
        println!("  /history              - Show the active conversation path");
        println!("  /edit <n> <text>      - Edit your n-th message on a new branch");
        println!("  /branches             - List every branch tip");
        println!("  /switch <id-prefix>   - Continue from another message");
        println!("  /retry                - Answer the last prompt again after a failure");
        println!("  /attach <path>        - Attach a file to the following turns");
        println!("  /detach               - Remove all attached files");
        println!("  /agents on|off        - Toggle criteria/grader/refiner agents");
        println!("  /search on|off        - Toggle search grounding");
        println!("  /code on|off          - Toggle code execution for the first draft");
        println!("  /iterations <1-5>     - Set the grading round cap");
        println!("  /export <path>        - Save the conversation as JSON");
        println!("  /clear                - Start a new conversation");
        println!("  /help, /h, /?         - Show this help");
        println!("  /quit, /exit, /q      - Exit chat");
        println!();
    }

    async fn handle_command(&mut self, command: ReplCommand) {
        match command {
            ReplCommand::Help => Self::print_help(),
            ReplCommand::Quit => {}
            ReplCommand::History => self.print_history(),
            ReplCommand::Branches => self.print_branches(),
            ReplCommand::Edit { index, text } => self.edit(index, &text).await,
            ReplCommand::Switch(prefix) => self.switch(&prefix),
            ReplCommand::Retry => self.retry().await,
            ReplCommand::Attach(path) => {
                if path.is_file() {
                    println!("Attached {}", path.display());
                    self.pending_files.push(path);
                } else {
                    println!("No such file: {}", path.display());
                }
            }
            ReplCommand::Detach => {
                println!("Removed {} attached file(s)", self.pending_files.len());
                self.pending_files.clear();
            }
            ReplCommand::Agents(enabled) => {
                self.session.settings = self.session.settings.with_quality_agents(enabled);
                self.print_settings();
            }
            ReplCommand::Search(enabled) => {
                self.session.settings = self.session.settings.with_search(enabled);
                self.print_settings();
            }
            ReplCommand::Code(enabled) => {
                self.session.settings = self.session.settings.with_code_execution(enabled);
                self.print_settings();
            }
            ReplCommand::Iterations(n) => {
                self.session.settings = self.session.settings.with_max_iterations(n);
                self.print_settings();
            }
            ReplCommand::Export(path) => self.export(&path),
            ReplCommand::Clear => {
                self.session.clear();
                println!("Conversation cleared.");
            }
        }
    }

    async fn process_prompt(&mut self, prompt: &str) {
        println!();
        let (attachments, warnings) = self.attachments.execute(&self.pending_files).await;
        let request = TurnRequest::new(prompt).with_attachments(attachments, warnings);

        let progress = self.progress();
        let cancel = cancel_on_ctrl_c();
        let result = self
            .submit
            .execute(&mut self.session, request, progress.as_ref(), &cancel)
            .await;
        cancel.cancel();
        self.show_result(result);
    }

    async fn edit(&mut self, index: usize, text: &str) {
        let Some(id) = self.nth_user_message(index) else {
            println!("No message {} on this branch; see /history", index);
            return;
        };
        println!();

        let progress = self.progress();
        let cancel = cancel_on_ctrl_c();
        let result = self
            .submit
            .edit_and_fork(&mut self.session, id, text, progress.as_ref(), &cancel)
            .await;
        cancel.cancel();
        self.show_result(result);
    }

    async fn retry(&mut self) {
        let progress = self.progress();
        let cancel = cancel_on_ctrl_c();
        let result = self
            .submit
            .retry(&mut self.session, progress.as_ref(), &cancel)
            .await;
        cancel.cancel();
        self.show_result(result);
    }

    fn progress(&self) -> Box<dyn ProgressNotifier> {
        if !self.output.show_progress {
            Box::new(draftsmith_application::NoProgress)
        } else if self.output.color {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(SimpleProgress)
        }
    }

    fn show_result(&self, result: Result<TurnOutcome, SubmitTurnError>) {
        match result {
            Ok(outcome) => {
                // JSON is for scripts; chat always shows readable text
                let format = match self.output.format {
                    OutputFormat::Json => OutputFormat::Answer,
                    other => other,
                };
                println!("{}", ConsoleFormatter::format(&outcome, format));
                for warning in outcome.warnings() {
                    println!("{} {}", "warning:".yellow(), warning);
                }
            }
            Err(e) if e.is_cancelled() => {
                println!("{}", "Cancelled before any draft was graded; use /retry to run it again.".yellow());
            }
            Err(SubmitTurnError::RunFailed(e)) => {
                eprintln!("{} {}", "Error:".red(), e);
                println!("Your prompt was kept; use /retry to answer it again.");
            }
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
        println!();
    }

    /// Id of the n-th (1-based) user message on the active path
    fn nth_user_message(&self, index: usize) -> Option<MessageId> {
        self.session
            .thread
            .active_path()
            .into_iter()
            .filter(|m| m.is_user())
            .nth(index.checked_sub(1)?)
            .map(Message::id)
    }

    fn print_history(&self) {
        let path = self.session.thread.active_path();
        if path.is_empty() {
            println!("No messages yet.");
            return;
        }

        println!();
        let mut user_index = 0;
        for message in path {
            if message.is_user() {
                user_index += 1;
                println!(
                    "{} {}",
                    format!("[{}] you ({})", user_index, message.id().short())
                        .cyan()
                        .bold(),
                    attachment_note(message)
                );
            } else {
                let status = message.status().map(|s| s.as_str()).unwrap_or("-");
                println!(
                    "{}",
                    format!("    assistant ({}, {})", message.id().short(), status).green()
                );
            }
            println!(
                "{}",
                ConsoleFormatter::indent(&preview(message.content(), PREVIEW_BYTES), "    ")
            );
        }
        println!();
    }

    fn print_branches(&self) {
        let thread = &self.session.thread;
        let leaves = thread.leaves();
        if leaves.is_empty() {
            println!("No messages yet.");
            return;
        }

        let active = thread.active_leaf_id();
        let active_path: Vec<MessageId> = thread.active_path().iter().map(|m| m.id()).collect();
        println!();
        for leaf in leaves {
            let marker = if Some(leaf.id()) == active {
                "*".green().bold().to_string()
            } else if active_path.contains(&leaf.id()) {
                "~".dimmed().to_string()
            } else {
                " ".to_string()
            };
            let depth = thread.context_path(leaf.id()).map(|p| p.len()).unwrap_or(0);
            println!(
                "{} {}  {} messages  {}",
                marker,
                leaf.id().short(),
                depth,
                preview(leaf.content(), PREVIEW_BYTES).dimmed()
            );
        }
        println!();
    }

    fn switch(&mut self, prefix: &str) {
        let Some(id) = self.session.thread.find_by_prefix(prefix).map(Message::id) else {
            println!("No unique message matches '{}'", prefix);
            return;
        };
        match self.session.thread.select_leaf(id) {
            Ok(()) => println!("Switched to {}", id.short()),
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    fn export(&self, path: &PathBuf) {
        let snapshot = self.session.thread.snapshot();
        let written = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| e.to_string())
            .and_then(|json| std::fs::write(path, json).map_err(|e| e.to_string()));
        match written {
            Ok(()) => println!("Saved {} message(s) to {}", snapshot.messages.len(), path.display()),
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }
}

/// Token cancelled on the next Ctrl-C; cancel it yourself once the turn ends
/// so the listener task exits.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let watched = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    watched.cancel();
                }
            }
            _ = watched.cancelled() => {}
        }
    });
    token
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
}

fn attachment_note(message: &Message) -> String {
    let names: Vec<&str> = message
        .attachments()
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    if names.is_empty() {
        String::new()
    } else {
        format!("[{}]", names.join(", "))
    }
}

/// Create the directory holding the history file; logs and returns false on failure
fn prepare_history_dir(path: &Path) -> bool {
    let Some(parent) = path.parent() else {
        return true;
    };
    match std::fs::create_dir_all(parent) {
        Ok(()) => true,
        Err(e) => {
            warn!("Could not create history directory {}: {}", parent.display(), e);
            false
        }
    }
}
