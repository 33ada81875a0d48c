//! `ctxlog` command-line caller.
//!
//! Every subcommand maps to one context operation and prints its text.

use anyhow::Context;
use clap::{Parser, Subcommand};
use ctxlog_config::ContextConfig;
use ctxlog_core::{ContextEngine, ContextOperations};
use log::{debug, info};
use std::io::{self, Read};
use std::path::PathBuf;

/// Text argument value that means "read from stdin".
const STDIN_ARG: &str = "-";

/// Command-line options for the context log.
#[derive(Debug, Parser)]
#[command(name = "ctxlog", version, about = "Local context log for development sessions")]
pub struct Cli {
    /// Optional path to a ctxlog.json5 config file (skips layered lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Storage directory override
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a session summary
    Summary {
        /// Summary text, or `-` for stdin
        text: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", short = 't')]
        tags: Vec<String>,
        /// Word limit for the stored text
        #[arg(long)]
        max_words: Option<usize>,
    },
    /// Record a significant event
    Event {
        /// Event type, e.g. error_solved
        event_type: String,
        /// Event details, or `-` for stdin
        details: String,
        #[arg(long)]
        project: Option<String>,
    },
    /// Show the most recent sessions and events
    Recent {
        #[arg(default_value_t = 3)]
        sessions: usize,
    },
    /// Show context relevant to a task
    Relevant {
        /// Task description, or `-` for stdin
        task: String,
    },
    /// Search stored context
    Search {
        query: String,
        /// sessions, events, summaries, decisions or all
        #[arg(long, default_value = "all")]
        scope: String,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Save a hierarchical summary and its key phrases
    Levels {
        /// Source text, or `-` for stdin
        text: String,
    },
    /// Show storage statistics
    Stats,
    /// Remove entries older than a number of days
    Cleanup {
        #[arg(default_value_t = 30)]
        days: u64,
    },
}

/// Load config from `--config` or the layered stack rooted at the cwd.
pub fn load_config(cli: &Cli) -> anyhow::Result<ContextConfig> {
    if let Some(path) = cli.config.as_ref() {
        return ContextConfig::load_from_path(path).context("failed to load config");
    }
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let layered = ContextConfig::load_layered(&cwd).context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    Ok(layered.config)
}

/// Run a parsed command, reading `-` arguments from stdin.
pub fn run(cli: Cli) -> anyhow::Result<String> {
    run_with_input(cli, &mut io::stdin())
}

/// Run a parsed command with an explicit source for `-` arguments.
pub fn run_with_input(cli: Cli, input: &mut dyn Read) -> anyhow::Result<String> {
    let config = load_config(&cli)?;
    let root = cli.root.clone().unwrap_or_else(|| config.storage_root());
    info!(
        "running {} (root={})",
        command_name(&cli.command),
        root.display()
    );
    let engine = ContextEngine::open(&root, config).context("failed to open context storage")?;
    let ops = ContextOperations::new(engine);

    let output = match cli.command {
        Command::Summary {
            text,
            tags,
            max_words,
        } => ops.submit_session_summary(&resolve_text(text, input)?, &tags, max_words),
        Command::Event {
            event_type,
            details,
            project,
        } => ops.record_event(
            &event_type,
            &resolve_text(details, input)?,
            project.as_deref(),
        ),
        Command::Recent { sessions } => ops.recent_context(sessions),
        Command::Relevant { task } => ops.relevant_context(&resolve_text(task, input)?),
        Command::Search {
            query,
            scope,
            limit,
        } => ops.search(&query, &scope, limit),
        Command::Levels { text } => ops.save_multi_level_summary(&resolve_text(text, input)?),
        Command::Stats => ops.stats(),
        Command::Cleanup { days } => ops.cleanup(days),
    };
    Ok(output)
}

/// Whether an operation's output reports a failure.
pub fn is_error(output: &str) -> bool {
    output.lines().any(|line| line.starts_with("Error: "))
}

fn resolve_text(value: String, input: &mut dyn Read) -> anyhow::Result<String> {
    if value != STDIN_ARG {
        return Ok(value);
    }
    let mut buffer = String::new();
    input
        .read_to_string(&mut buffer)
        .context("failed to read text from stdin")?;
    Ok(buffer)
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Summary { .. } => "summary",
        Command::Event { .. } => "event",
        Command::Recent { .. } => "recent",
        Command::Relevant { .. } => "relevant",
        Command::Search { .. } => "search",
        Command::Levels { .. } => "levels",
        Command::Stats => "stats",
        Command::Cleanup { .. } => "cleanup",
    }
}
