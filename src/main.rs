//! Lockin - spaced-repetition study scheduler
//!
//! CLI entry point with global panic handler.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lockin::cli::{outcome_exit_code, parse_timestamp};
use lockin::config::{crash_log_path, Config};
use lockin::error::{exit_codes, LockinError};
use lockin::storage::FileConceptStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// Lockin - spaced-repetition study scheduler
#[derive(Parser)]
#[command(name = "lockin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Clock to use instead of now (RFC 3339, e.g. 2025-03-01T09:00:00Z)
    #[arg(long, global = true)]
    at: Option<String>,

    /// Concept store directory (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Define a new concept
    Add {
        /// Short name of the concept
        name: String,
        /// Material to recall
        content: String,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", short)]
        tags: Vec<String>,
        /// Parent concept ID
        #[arg(long)]
        parent: Option<String>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Grade a recall of a concept (1 failed, 2 poor, 3 good, 4 perfect)
    Review {
        /// Concept ID
        id: String,
        /// Recall grade, 1-4
        #[arg(allow_negative_numbers = true)]
        grade: i64,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show concepts due for review
    Due {
        /// Maximum number of concepts to show
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List concepts, newest first
    List {
        /// Maximum number of concepts to show
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show the review history of a concept
    History {
        /// Concept ID
        id: String,
        /// Show only the most recent reviews
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    setup_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("lockin error: {}", e);
            let code = if e.is_invalid_input() {
                exit_codes::INVALID_INPUT
            } else {
                exit_codes::ERROR
            };
            to_exit_code(code)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.lockin/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("lockin panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Some(parent) = crash_log.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Log to stderr; stdout carries command output.
///
/// The filter comes from `LOCKIN_LOG` and defaults to `warn`.
fn setup_logging() {
    let filter = EnvFilter::try_from_env("LOCKIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, LockinError> {
    let cli = Cli::parse();

    let now = resolve_clock(cli.at.as_deref())?;
    let config = Config::load();

    let data_dir = cli
        .data_dir
        .or_else(|| config.data_dir())
        .ok_or_else(|| {
            LockinError::config("Could not determine concepts directory (no home directory)")
        })?;
    let store = FileConceptStore::with_dir(data_dir)?;

    let code = match cli.command {
        Commands::Add {
            name,
            content,
            tags,
            parent,
            json,
            quiet,
        } => run_add(store, &name, &content, tags, parent, json, quiet, now),
        Commands::Review {
            id,
            grade,
            json,
            quiet,
        } => run_review(store, config, &id, grade, json, quiet, now),
        Commands::Due { limit, json, quiet } => run_due(store, limit, json, quiet, now),
        Commands::List { limit, json, quiet } => run_list(store, limit, json, quiet, now),
        Commands::History {
            id,
            limit,
            json,
            quiet,
        } => run_history(store, &id, limit, json, quiet),
    };

    Ok(to_exit_code(code))
}

/// Use `--at` when given, otherwise the system clock.
fn resolve_clock(at: Option<&str>) -> Result<DateTime<Utc>, LockinError> {
    match at {
        Some(value) => parse_timestamp(value),
        None => Ok(Utc::now()),
    }
}

fn to_exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn print_output(formatted: &str) {
    if !formatted.is_empty() {
        print!("{}", formatted);
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

#[allow(clippy::too_many_arguments)]
fn run_add(
    store: FileConceptStore,
    name: &str,
    content: &str,
    tags: Vec<String>,
    parent: Option<String>,
    json: bool,
    quiet: bool,
    now: DateTime<Utc>,
) -> i32 {
    use lockin::cli::add::{AddCommand, AddOptions};

    let cmd = AddCommand::new(store);
    let options = AddOptions {
        json,
        quiet,
        tags,
        parent,
    };

    let output = cmd.run(name, content, &options, now);
    print_output(&cmd.format_output(&output, &options));

    outcome_exit_code(output.success, output.invalid_input)
}

fn run_review(
    store: FileConceptStore,
    config: Config,
    id: &str,
    grade: i64,
    json: bool,
    quiet: bool,
    now: DateTime<Utc>,
) -> i32 {
    use lockin::cli::review::{ReviewCommand, ReviewOptions};

    let cmd = ReviewCommand::new(store, config);
    let options = ReviewOptions { json, quiet };

    let output = cmd.run(id, grade, &options, now);
    print_output(&cmd.format_output(&output, &options));

    outcome_exit_code(output.success, output.invalid_input)
}

fn run_due(
    store: FileConceptStore,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
    now: DateTime<Utc>,
) -> i32 {
    use lockin::cli::due::{DueCommand, DueOptions};

    let cmd = DueCommand::new(store);
    let options = DueOptions { json, quiet, limit };

    let output = cmd.run(&options, now);
    print_output(&cmd.format_output(&output, &options));

    outcome_exit_code(output.success, output.invalid_input)
}

fn run_list(
    store: FileConceptStore,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
    now: DateTime<Utc>,
) -> i32 {
    use lockin::cli::list::{ListCommand, ListOptions};

    let cmd = ListCommand::new(store);
    let options = ListOptions { json, quiet, limit };

    let output = cmd.run(&options, now);
    print_output(&cmd.format_output(&output, &options));

    outcome_exit_code(output.success, output.invalid_input)
}

fn run_history(
    store: FileConceptStore,
    id: &str,
    limit: Option<usize>,
    json: bool,
    quiet: bool,
) -> i32 {
    use lockin::cli::history::{HistoryCommand, HistoryOptions};

    let cmd = HistoryCommand::new(store);
    let options = HistoryOptions { json, quiet, limit };

    let output = cmd.run(id, &options);
    print_output(&cmd.format_output(&output, &options));

    outcome_exit_code(output.success, output.invalid_input)
}
