//! Sandboxed file store: list, read, and write-with-backup.

use std::fs;
use std::path::Path;

use ignore::WalkBuilder;
use keel_utils::{AtomicWriteOptions, PersistMode, atomic_write_with_options};
use serde::Serialize;
use tracing::{debug, info};

use crate::action_log::{ActionLog, FileActionLog};
use crate::backup::{BackupStore, SiblingBackups, TimestampedBackups};
use crate::config::{BackupMode, StoreConfig};
use crate::process::CommandRunner;
use crate::sandbox::Sandbox;
use crate::ToolError;

/// Result of a successful [`FileStore::write`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Workspace-relative backup path, `None` when the file was new.
    pub backup: Option<String>,
    pub written: bool,
}

pub struct FileStore {
    sandbox: Sandbox,
    config: StoreConfig,
    backups: Box<dyn BackupStore>,
    log: Box<dyn ActionLog>,
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore")
            .field("root", &self.sandbox.root())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FileStore {
    #[must_use]
    pub fn new(
        sandbox: Sandbox,
        config: StoreConfig,
        backups: Box<dyn BackupStore>,
        log: Box<dyn ActionLog>,
    ) -> Self {
        Self {
            sandbox,
            config,
            backups,
            log,
        }
    }

    /// Store with on-disk collaborators chosen by `config`.
    #[must_use]
    pub fn open(sandbox: Sandbox, config: StoreConfig) -> Self {
        let root = sandbox.root().to_path_buf();
        let backups: Box<dyn BackupStore> = match config.backup_mode {
            BackupMode::Timestamped => {
                Box::new(TimestampedBackups::new(&root, config.backup_dir.clone()))
            }
            BackupMode::Sibling => Box::new(SiblingBackups::new(&root)),
        };
        let log = Box::new(FileActionLog::new(root.join(&config.log_file)));
        Self::new(sandbox, config, backups, log)
    }

    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.sandbox.root()
    }

    /// Names directly under `dir`, sorted, without forbidden directories.
    pub fn list(&self, dir: &str) -> Result<Vec<String>, ToolError> {
        let resolved = self.sandbox.validate(dir)?;
        let display = self.sandbox.relative(&resolved);
        if !resolved.exists() {
            return Err(ToolError::NotFound { path: display });
        }
        if !resolved.is_dir() {
            return Err(ToolError::NotADirectory { path: display });
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&resolved).map_err(|e| ToolError::io(&resolved, e))? {
            let entry = entry.map_err(|e| ToolError::io(&resolved, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.sandbox.is_forbidden_dir_name(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// Workspace-relative file paths under `dir`, depth-first, sorted.
    ///
    /// `extensions` entries may be given with or without their leading dot.
    /// A missing directory yields an empty list, and so does the backup
    /// directory or anything below it.
    pub fn list_recursive(
        &self,
        dir: &str,
        extensions: Option<&[String]>,
    ) -> Result<Vec<String>, ToolError> {
        let resolved = self.sandbox.validate(dir)?;
        if !resolved.is_dir() {
            return Ok(Vec::new());
        }
        let backup_dir = self.workspace_relative(&self.config.backup_dir);
        let log_file = self.workspace_relative(&self.config.log_file);
        if backup_dir
            .as_deref()
            .is_some_and(|backups| is_within(&self.sandbox.relative(&resolved), backups))
        {
            return Ok(Vec::new());
        }

        let wanted: Option<Vec<String>> = extensions.map(|exts| {
            exts.iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect()
        });

        let root = self.root().to_path_buf();
        let sandbox = self.sandbox.clone();
        let walker = WalkBuilder::new(&resolved)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                if sandbox.is_forbidden_dir_name(&name) {
                    return false;
                }
                backup_dir.as_deref() != Some(sandbox.relative(entry.path()).as_str())
            })
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let rel = self.sandbox.relative(entry.path());
            if log_file.as_deref() == Some(rel.as_str()) {
                continue;
            }
            if let Some(wanted) = &wanted {
                let ext = entry
                    .path()
                    .extension()
                    .map(|e| e.to_string_lossy().to_lowercase());
                if !ext.is_some_and(|ext| wanted.contains(&ext)) {
                    continue;
                }
            }
            files.push(rel);
        }
        debug!(root = %root.display(), count = files.len(), "Listed files");
        files.sort();
        Ok(files)
    }

    /// `raw` as the sandbox would resolve it, `None` for the root or an invalid path.
    fn workspace_relative(&self, raw: &str) -> Option<String> {
        let resolved = self.sandbox.validate(raw).ok()?;
        Some(self.sandbox.relative(&resolved)).filter(|rel| rel != ".")
    }

    /// Full content of a file, invalid UTF-8 replaced lossily.
    pub fn read(&self, path: &str) -> Result<String, ToolError> {
        let resolved = self.sandbox.validate(path)?;
        let display = self.sandbox.relative(&resolved);
        if !resolved.exists() {
            return Err(ToolError::NotFound { path: display });
        }
        if !resolved.is_file() {
            return Err(ToolError::NotAFile { path: display });
        }
        let bytes = fs::read(&resolved).map_err(|e| ToolError::io(&resolved, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Like [`FileStore::read`], capped at `read_max_lines` lines.
    pub fn read_bounded(&self, path: &str) -> Result<String, ToolError> {
        let content = self.read(path)?;
        Ok(bound_lines(&content, self.config.read_max_lines))
    }

    /// Replace a file's content, backing up any previous version first.
    pub fn write(&self, path: &str, content: &str) -> Result<WriteOutcome, ToolError> {
        let resolved = self.sandbox.validate(path)?;
        let rel = self.sandbox.relative(&resolved);
        if resolved.is_dir() {
            return Err(ToolError::NotAFile { path: rel });
        }

        let mut mode = PersistMode::Default;
        let backup = if resolved.is_file() {
            let previous = fs::read(&resolved).map_err(|e| ToolError::io(&resolved, e))?;
            let location = self.backups.save(&rel, &previous)?;
            self.log.append("BACKUP", &location)?;
            mode = PersistMode::preserving(&resolved);
            Some(location)
        } else {
            None
        };

        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| ToolError::write_failed(parent, e))?;
        }
        let options = AtomicWriteOptions {
            mode,
            ..AtomicWriteOptions::default()
        };
        atomic_write_with_options(&resolved, content.as_bytes(), options)
            .map_err(|e| ToolError::write_failed(&resolved, e))?;
        self.log.append("WRITE", &rel)?;

        info!(path = %rel, bytes = content.len(), backup = ?backup, "File written");
        Ok(WriteOutcome {
            backup,
            written: true,
        })
    }

    pub fn log(&self, action: &str, detail: &str) -> Result<(), ToolError> {
        self.log.append(action, detail)
    }

    /// Run a guarded command, recording it as `COMMAND` first.
    pub fn run_command(&self, runner: &CommandRunner, command: &str) -> Result<String, ToolError> {
        runner.check(command)?;
        self.log.append("COMMAND", command.trim())?;
        runner.run(command)
    }
}

fn is_within(rel: &str, dir: &str) -> bool {
    rel == dir || rel.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
}

fn bound_lines(content: &str, max_lines: usize) -> String {
    if content.split('\n').count() <= max_lines {
        return content.to_string();
    }
    let head: Vec<&str> = content.split('\n').take(max_lines).collect();
    format!(
        "{}\n// ... (truncated at {max_lines} lines)",
        head.join("\n")
    )
}
