//! Keel CLI - binary entry point.
//!
//! Every subcommand works against one workspace root (`--root`, default the
//! current directory). Configuration is resolved once per invocation and
//! threaded into the tools; diagnostics go to `~/.keel/logs/keel.log` while
//! user-facing output stays on stdout and stderr.

mod commands;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(name = "keel", version, about = "Sandboxed workspace index, search and edit agent")]
struct Cli {
    /// Workspace root every path is confined to.
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rebuild the workspace index.
    Index,
    /// Rank indexed files against keywords.
    Search { query: Vec<String> },
    /// Heuristic review of the files relevant to a question.
    Analyze {
        question: Vec<String>,
        /// Print the preview context instead of the report.
        #[arg(long)]
        context: bool,
    },
    /// Find relevant files and apply a modifications file after review.
    Agent {
        instruction: Vec<String>,
        /// JSON file with `[{ "path": ..., "content": ... }]` entries,
        /// relative to the workspace root.
        #[arg(long, value_name = "FILE")]
        apply: Option<PathBuf>,
        /// Apply every change without asking.
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Line diff of two files; a missing file counts as empty.
    Diff {
        old: PathBuf,
        new: PathBuf,
        /// Conventional unified diff instead of the numbered view.
        #[arg(long)]
        unified: bool,
    },
    /// Sandboxed listing and reading.
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
    /// Run a guarded shell command in the workspace root.
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum FilesCommand {
    /// Workspace-relative paths of every file below a directory.
    List {
        #[arg(default_value = ".")]
        dir: String,
        /// Only the entry names directly under the directory.
        #[arg(long, conflicts_with = "extensions")]
        shallow: bool,
        /// Only files with these extensions.
        #[arg(long = "ext", value_name = "EXT", num_args = 1..)]
        extensions: Vec<String>,
    },
    /// Print a file's content.
    Read {
        file: String,
        /// Stop after the configured line limit.
        #[arg(long)]
        bounded: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match commands::dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_keel_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: keep stdout clean and only surface warnings on stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::new("warn"))
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_keel_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in keel_log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn keel_log_file_candidates() -> Vec<PathBuf> {
    // ~/.keel/logs/keel.log, next to the user config.
    keel_config::user_config_path()
        .and_then(|config| config.parent().map(|dir| dir.join("logs").join("keel.log")))
        .into_iter()
        .collect()
}
