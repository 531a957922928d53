//! Workspace tooling - sandboxed file access, indexing, search and commands.
//!
//! Every filesystem mutation goes through [`FileStore`], which validates the
//! target with [`Sandbox`] and hands prior content to a [`BackupStore`] before
//! overwriting. Shell commands go through [`CommandRunner`], which consults the
//! [`CommandBlacklist`] first.

pub mod action_log;
pub mod backup;
pub mod command_blacklist;
pub mod config;
pub mod indexer;
pub mod process;
pub mod sandbox;
pub mod search;
pub mod store;

pub use action_log::{ActionLog, FileActionLog, MemoryActionLog};
pub use backup::{BackupStore, MemoryBackups, SiblingBackups, TimestampedBackups};
pub use command_blacklist::CommandBlacklist;
pub use config::{
    BackupMode, CommandConfig, IndexerConfig, SearchConfig, StoreConfig, WorkspaceConfig,
};
pub use indexer::{Indexer, index_path, load_index};
pub use process::CommandRunner;
pub use sandbox::{SERVER_FORBIDDEN_DIRS, STORE_FORBIDDEN_DIRS, Sandbox, default_deny_patterns};
pub use search::{score_entry, search, search_workspace};
pub use store::{FileStore, WriteOutcome};

use std::path::PathBuf;

/// Error types for workspace tools.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Bad args: {message}")]
    BadArgs { message: String },
    #[error("Sandbox violation: {0}")]
    SandboxViolation(DenialReason),
    #[error("Not found: {path}")]
    NotFound { path: String },
    #[error("Not a directory: {path}")]
    NotADirectory { path: String },
    #[error("Not a file: {path}")]
    NotAFile { path: String },
    #[error("Index not found at {}; run `keel index` first", path.display())]
    IndexMissing { path: PathBuf },
    #[error("Index at {} is corrupt: {source}", path.display())]
    IndexCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Write failed for {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed ({}): {command}: {stderr}", exit_label(*code))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Command output exceeded {limit} bytes")]
    OutputLimitExceeded { limit: usize },
}

impl ToolError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised by the sandbox before any IO happened.
    #[must_use]
    pub fn is_denial(&self) -> bool {
        matches!(self, Self::SandboxViolation(_) | Self::BadArgs { .. })
    }
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "killed by signal".to_string(), |c| format!("exit {c}"))
}

/// Why the sandbox refused a path or command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenialReason {
    OutsideWorkspace {
        attempted: String,
    },
    ForbiddenPath {
        attempted: String,
        segment: String,
    },
    DeniedPatternMatched {
        attempted: String,
        pattern: String,
    },
    CommandBlacklisted {
        command: String,
        reason: String,
    },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::OutsideWorkspace { attempted } => {
                write!(f, "Path outside workspace: {attempted}")
            }
            DenialReason::ForbiddenPath { attempted, segment } => {
                write!(f, "Path '{attempted}' enters forbidden directory '{segment}'")
            }
            DenialReason::DeniedPatternMatched { attempted, pattern } => {
                write!(f, "Path '{attempted}' matched denied pattern '{pattern}'")
            }
            DenialReason::CommandBlacklisted { command, reason } => {
                write!(f, "Command blocked: {reason} (command: {command})")
            }
        }
    }
}
