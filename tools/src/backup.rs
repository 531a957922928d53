//! Backup strategies used by the file store before an overwrite.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};

use crate::ToolError;

/// Receives the prior bytes of a file about to be overwritten.
pub trait BackupStore: Send + Sync {
    /// Preserve `bytes` as the previous content of workspace-relative `rel`.
    ///
    /// Returns the backup location as a workspace-relative path.
    fn save(&self, rel: &str, bytes: &[u8]) -> Result<String, ToolError>;
}

/// `<backup_dir>/<flattened path>.<timestamp>.bak`, never overwritten.
#[derive(Debug, Clone)]
pub struct TimestampedBackups {
    root: PathBuf,
    dir: String,
}

impl TimestampedBackups {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            dir: dir.into(),
        }
    }

    fn backup_root(&self) -> PathBuf {
        self.root.join(&self.dir)
    }
}

impl BackupStore for TimestampedBackups {
    fn save(&self, rel: &str, bytes: &[u8]) -> Result<String, ToolError> {
        let backup_root = self.backup_root();
        fs::create_dir_all(&backup_root).map_err(|e| ToolError::write_failed(&backup_root, e))?;

        let stamp = backup_timestamp();
        let name = unique_name(&backup_root, &flatten(rel), &stamp);
        let target = backup_root.join(&name);
        fs::write(&target, bytes).map_err(|e| ToolError::write_failed(&target, e))?;

        tracing::debug!(path = %target.display(), "Backup written");
        Ok(format!("{}/{name}", self.dir.trim_end_matches(['/', '\\'])))
    }
}

/// `<path>.bak` next to the original.
#[derive(Debug, Clone)]
pub struct SiblingBackups {
    root: PathBuf,
}

impl SiblingBackups {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl BackupStore for SiblingBackups {
    fn save(&self, rel: &str, bytes: &[u8]) -> Result<String, ToolError> {
        let rel_backup = format!("{rel}.bak");
        let target = self.root.join(&rel_backup);
        fs::write(&target, bytes).map_err(|e| ToolError::write_failed(&target, e))?;
        Ok(rel_backup)
    }
}

/// In-memory backups for tests. Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackups {
    saved: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemoryBackups {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved `(rel, bytes)` pair, oldest first.
    #[must_use]
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BackupStore for MemoryBackups {
    fn save(&self, rel: &str, bytes: &[u8]) -> Result<String, ToolError> {
        let mut saved = self.saved.lock().unwrap_or_else(PoisonError::into_inner);
        saved.push((rel.to_string(), bytes.to_vec()));
        Ok(format!("memory:{rel}#{}", saved.len()))
    }
}

fn flatten(rel: &str) -> String {
    rel.replace(['/', '\\'], "_")
}

/// ISO-8601 UTC with `:` and `.` made filename-safe.
fn backup_timestamp() -> String {
    Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}

fn unique_name(dir: &Path, safe: &str, stamp: &str) -> String {
    let base = format!("{safe}.{stamp}.bak");
    if !dir.join(&base).exists() {
        return base;
    }
    (1..)
        .map(|n| format!("{safe}.{stamp}-{n}.bak"))
        .find(|name| !dir.join(name).exists())
        .unwrap_or(base)
}
