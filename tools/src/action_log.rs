//! Append-only action log, one `[<ISO-8601>] <ACTION>: <detail>` line per entry.
//!
//! This is the user-visible audit trail of what keel did to the workspace. It
//! is separate from `tracing` diagnostics.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};

use crate::ToolError;

pub trait ActionLog: Send + Sync {
    fn append(&self, action: &str, detail: &str) -> Result<(), ToolError>;
}

/// Format one log line (without the trailing newline).
#[must_use]
pub fn format_line(timestamp: &str, action: &str, detail: &str) -> String {
    format!("[{timestamp}] {action}: {detail}")
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Appends to a text file, creating it on first use.
#[derive(Debug, Clone)]
pub struct FileActionLog {
    path: PathBuf,
}

impl FileActionLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ActionLog for FileActionLog {
    fn append(&self, action: &str, detail: &str) -> Result<(), ToolError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ToolError::io(&self.path, e))?;
        writeln!(file, "{}", format_line(&now(), action, detail))
            .map_err(|e| ToolError::io(&self.path, e))
    }
}

/// In-memory log for tests. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryActionLog {
    entries: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemoryActionLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(action, detail)` pairs, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        self.entries().into_iter().map(|(action, _)| action).collect()
    }
}

impl ActionLog for MemoryActionLog {
    fn append(&self, action: &str, detail: &str) -> Result<(), ToolError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((action.to_string(), detail.to_string()));
        Ok(())
    }
}
