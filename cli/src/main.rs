//! CLI entrypoint for draftsmith
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use draftsmith_application::{
    AgentSet, ConversationLogger, LoadAttachmentsUseCase, NoProgress, ProgressNotifier,
    RefinementOrchestrator, RefinementParams, SessionContext, SubmitTurnUseCase, TurnRequest,
};
use draftsmith_domain::{ConfigIssue, OutputFormat};
use draftsmith_infrastructure::{
    ConfigLoader, FileConfig, GeminiConfig, GeminiGateway, JsonlConversationLogger,
    LocalAttachmentExtractor,
};
use draftsmith_presentation::{
    ChatRepl, Cli, ConsoleFormatter, OutputConfig, ProgressReporter, ReplConfig, SimpleProgress,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| config.logging.dir.as_ref().map(PathBuf::from));
    let _log_guard = init_tracing(cli.verbose, log_dir.as_deref())?;

    info!("Starting draftsmith");

    let warnings = config.ensure_valid()?;
    print_issues(&warnings);

    let settings = refinement_settings(&cli, &config);
    let output = output_config(&cli, &config);
    if !output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let gateway = GeminiConfig::from_file_config(&config)
        .and_then(GeminiGateway::new)
        .context("Failed to set up the Gemini gateway")?;
    let (models, _) = config.models.parse_agent_models();
    let agents = AgentSet::llm(Arc::new(gateway), models);

    let mut orchestrator = RefinementOrchestrator::new(agents);
    let mut submit_turn = None;
    if let Some(path) = &config.logging.conversation_log {
        let logger: Arc<dyn ConversationLogger> = Arc::new(
            JsonlConversationLogger::open(path)
                .with_context(|| format!("Failed to open conversation log {}", path))?,
        );
        orchestrator = orchestrator.with_conversation_logger(logger.clone());
        submit_turn =
            Some(SubmitTurnUseCase::new(orchestrator.clone()).with_conversation_logger(logger));
    }
    let submit_turn = submit_turn.unwrap_or_else(|| SubmitTurnUseCase::new(orchestrator));
    let load_attachments = LoadAttachmentsUseCase::new(Arc::new(LocalAttachmentExtractor::new()));
    let session = SessionContext::new(settings);

    // Chat mode
    if cli.chat {
        let repl_config = ReplConfig {
            history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        };
        let mut repl = ChatRepl::new(submit_turn, load_attachments, session)
            .with_output(output)
            .with_repl_config(repl_config)
            .with_files(cli.files);

        repl.run().await?;
        return Ok(());
    }

    // Single prompt mode - prompt is required
    let prompt = match cli.prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => bail!("A prompt is required. Use --chat for interactive mode."),
    };

    let (attachments, attachment_warnings) = load_attachments.execute(&cli.files).await;
    let request = TurnRequest::new(prompt).with_attachments(attachments, attachment_warnings);

    let progress: Box<dyn ProgressNotifier> = if !output.show_progress {
        Box::new(NoProgress)
    } else if output.color {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    let cancel = CancellationToken::new();
    let watched = cancel.clone();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            watched.cancel();
        }
    });

    let mut session = session;
    let result = submit_turn
        .execute(&mut session, request, progress.as_ref(), &cancel)
        .await;
    ctrl_c.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => bail!("Cancelled before an answer was ready"),
        Err(e) => return Err(e).context("Refinement run failed"),
    };

    // JSON output carries the warnings itself
    if output.format != OutputFormat::Json {
        for warning in outcome.warnings() {
            eprintln!("warning: {}", warning);
        }
    }

    println!("{}", ConsoleFormatter::format(&outcome, output.format));

    Ok(())
}

/// Install the stderr subscriber, plus a daily rolling file when a log
/// directory is configured. Keep the returned guard alive until exit.
fn init_tracing(verbose: u8, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = if std::env::var_os("RUST_LOG").is_some() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"), // -vvv or more
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "draftsmith.log");
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(file_writer))
                .init();
            Ok(Some(guard))
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            Ok(None)
        }
    }
}

/// File settings with command-line overrides applied
fn refinement_settings(cli: &Cli, config: &FileConfig) -> RefinementParams {
    let (mut params, _) = config.refinement.to_params();
    if let Some(n) = cli.max_iterations {
        params = params.with_max_iterations(n);
    }
    if cli.no_agents {
        params = params.with_quality_agents(false);
    }
    if cli.no_search {
        params = params.with_search(false);
    }
    if cli.code_execution {
        params = params.with_code_execution(true);
    }
    params
}

fn output_config(cli: &Cli, config: &FileConfig) -> OutputConfig {
    OutputConfig {
        format: cli
            .output
            .map(Into::into)
            .or(config.output.format)
            .unwrap_or_default(),
        color: config.output.color,
        show_progress: config.output.show_progress && !cli.quiet,
    }
}

fn print_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        eprintln!("config warning: {}", issue);
    }
}
