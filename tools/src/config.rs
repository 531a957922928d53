//! Resolved configuration values threaded into tool constructors.
//!
//! `keel-config` parses the TOML file and produces these; tests build them
//! directly through `Default`.

use serde::Deserialize;

use crate::sandbox::STORE_FORBIDDEN_DIRS;

pub const DEFAULT_INDEX_FILE: &str = ".keel-index.json";
pub const DEFAULT_LOG_FILE: &str = ".keel-log.txt";
pub const DEFAULT_BACKUP_DIR: &str = ".keel-backups";
pub const DEFAULT_PREVIEW_LINES: usize = 40;
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_READ_MAX_LINES: usize = 2000;
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

pub const DEFAULT_EXTENSIONS: &[&str] = &[".js", ".ts", ".tsx", ".jsx", ".py", ".json"];

pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".env",
];

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Sandbox policy for the workspace root.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub forbidden_dirs: Vec<String>,
    pub deny_patterns: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            forbidden_dirs: owned(STORE_FORBIDDEN_DIRS),
            deny_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Index file name, written at the workspace root.
    pub file_name: String,
    pub preview_lines: usize,
    /// Allowed extensions, each with its leading dot.
    pub extensions: Vec<String>,
    pub ignore_dirs: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_INDEX_FILE.to_string(),
            preview_lines: DEFAULT_PREVIEW_LINES,
            extensions: owned(DEFAULT_EXTENSIONS),
            ignore_dirs: owned(DEFAULT_IGNORE_DIRS),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// How prior file content is preserved before an overwrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackupMode {
    /// `<backup_dir>/<flattened path>.<timestamp>.bak`
    #[default]
    Timestamped,
    /// `<path>.bak` next to the original, replaced on every write.
    Sibling,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub log_file: String,
    pub backup_dir: String,
    pub backup_mode: BackupMode,
    pub read_max_lines: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            log_file: DEFAULT_LOG_FILE.to_string(),
            backup_dir: DEFAULT_BACKUP_DIR.to_string(),
            backup_mode: BackupMode::Timestamped,
            read_max_lines: DEFAULT_READ_MAX_LINES,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CommandConfig {
    pub max_output_bytes: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}
