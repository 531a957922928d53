//! Configuration loading for Keel.
//!
//! The file is looked up at `<root>/.keel.toml`, then `~/.keel/config.toml`.
//! Every field is optional; [`KeelConfig::resolve`] fills the gaps with the
//! defaults from `keel-tools` and produces the explicit values the tool
//! constructors take.
//!
//! ```toml
//! [workspace]
//! forbidden_dirs = ["node_modules", ".git"]
//! deny_secrets = true # adds keys, certificates, .env and credential files
//! deny_patterns = ["secrets/**"]
//!
//! [index]
//! file = ".keel-index.json"
//! preview_lines = 40
//! extensions = [".js", ".ts", ".py"]
//! ignore_dirs = ["node_modules", ".git", "dist"]
//!
//! [search]
//! max_results = 5
//!
//! [store]
//! log_file = ".keel-log.txt"
//! backup_dir = ".keel-backups"
//! backup_mode = "timestamped" # or "sibling"
//! read_max_lines = 2000
//!
//! [commands]
//! max_output_bytes = 10485760
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use keel_tools::{
    BackupMode, CommandConfig, IndexerConfig, SearchConfig, StoreConfig, WorkspaceConfig,
    default_deny_patterns,
};
use serde::Deserialize;

/// Per-workspace config file name, looked up at the workspace root.
pub const WORKSPACE_CONFIG_FILE: &str = ".keel.toml";

#[derive(Debug, Default, Deserialize)]
pub struct KeelConfig {
    pub workspace: Option<WorkspaceSection>,
    pub index: Option<IndexSection>,
    pub search: Option<SearchSection>,
    pub store: Option<StoreSection>,
    pub commands: Option<CommandsSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceSection {
    pub forbidden_dirs: Option<Vec<String>>,
    pub deny_secrets: Option<bool>,
    pub deny_patterns: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct IndexSection {
    pub file: Option<String>,
    pub preview_lines: Option<usize>,
    pub extensions: Option<Vec<String>>,
    pub ignore_dirs: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSection {
    pub max_results: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreSection {
    pub log_file: Option<String>,
    pub backup_dir: Option<String>,
    pub backup_mode: Option<BackupMode>,
    pub read_max_lines: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommandsSection {
    pub max_output_bytes: Option<usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Fully resolved configuration, one value per component.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub workspace: WorkspaceConfig,
    pub indexer: IndexerConfig,
    pub search: SearchConfig,
    pub store: StoreConfig,
    pub commands: CommandConfig,
    /// File the values came from, `None` when running on defaults.
    pub source: Option<PathBuf>,
}

impl KeelConfig {
    /// Load the first config file that exists for `root`.
    ///
    /// Returns `Ok(None)` when there is no config file at all.
    pub fn load(root: &Path) -> Result<Option<(Self, PathBuf)>, ConfigError> {
        let Some(path) = Self::path(root) else {
            return Ok(None);
        };
        let config = Self::load_from(&path)?;
        Ok(Some((config, path)))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        Self::parse(&content, path)
    }

    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|err| {
            tracing::warn!("Failed to parse config at {:?}: {}", path, err);
            ConfigError::Parse {
                path: path.to_path_buf(),
                source: err,
            }
        })
    }

    /// The config file that [`KeelConfig::load`] would read, if any exists.
    #[must_use]
    pub fn path(root: &Path) -> Option<PathBuf> {
        config_candidates(root).into_iter().find(|p| p.is_file())
    }

    #[must_use]
    pub fn resolve(&self) -> ResolvedConfig {
        ResolvedConfig {
            workspace: self.workspace(),
            indexer: self.indexer(),
            search: self.search(),
            store: self.store(),
            commands: self.commands(),
            source: None,
        }
    }

    #[must_use]
    pub fn workspace(&self) -> WorkspaceConfig {
        let mut config = WorkspaceConfig::default();
        if let Some(section) = &self.workspace {
            if let Some(dirs) = &section.forbidden_dirs {
                config.forbidden_dirs.clone_from(dirs);
            }
            if section.deny_secrets == Some(true) {
                config.deny_patterns = default_deny_patterns();
            }
            if let Some(patterns) = &section.deny_patterns {
                config.deny_patterns.extend(patterns.iter().cloned());
            }
        }
        config
    }

    #[must_use]
    pub fn indexer(&self) -> IndexerConfig {
        let mut config = IndexerConfig::default();
        if let Some(section) = &self.index {
            if let Some(file) = section.file.as_deref().filter(|f| !f.trim().is_empty()) {
                config.file_name = file.to_string();
            }
            if let Some(lines) = positive("index.preview_lines", section.preview_lines) {
                config.preview_lines = lines;
            }
            if let Some(extensions) = &section.extensions {
                config.extensions = extensions.iter().map(|e| with_leading_dot(e)).collect();
            }
            if let Some(dirs) = &section.ignore_dirs {
                config.ignore_dirs.clone_from(dirs);
            }
        }
        config
    }

    #[must_use]
    pub fn search(&self) -> SearchConfig {
        let mut config = SearchConfig::default();
        if let Some(max) = positive(
            "search.max_results",
            self.search.as_ref().and_then(|s| s.max_results),
        ) {
            config.max_results = max;
        }
        config
    }

    #[must_use]
    pub fn store(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        if let Some(section) = &self.store {
            if let Some(log_file) = section.log_file.as_deref().filter(|f| !f.trim().is_empty()) {
                config.log_file = log_file.to_string();
            }
            if let Some(dir) = section.backup_dir.as_deref().filter(|d| !d.trim().is_empty()) {
                config.backup_dir = dir.to_string();
            }
            if let Some(mode) = section.backup_mode {
                config.backup_mode = mode;
            }
            if let Some(lines) = positive("store.read_max_lines", section.read_max_lines) {
                config.read_max_lines = lines;
            }
        }
        config
    }

    #[must_use]
    pub fn commands(&self) -> CommandConfig {
        let mut config = CommandConfig::default();
        if let Some(bytes) = positive(
            "commands.max_output_bytes",
            self.commands.as_ref().and_then(|c| c.max_output_bytes),
        ) {
            config.max_output_bytes = bytes;
        }
        config
    }
}

/// Load and resolve the configuration for `root`, defaults when absent.
pub fn load_resolved(root: &Path) -> Result<ResolvedConfig, ConfigError> {
    match KeelConfig::load(root)? {
        Some((config, path)) => {
            tracing::debug!(path = %path.display(), "Loaded config");
            Ok(ResolvedConfig {
                source: Some(path),
                ..config.resolve()
            })
        }
        None => Ok(ResolvedConfig::default()),
    }
}

/// Lookup order: workspace file first, then the user file.
#[must_use]
pub fn config_candidates(root: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![root.join(WORKSPACE_CONFIG_FILE)];
    if let Some(user) = user_config_path() {
        candidates.push(user);
    }
    candidates
}

#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".keel").join("config.toml"))
}

fn positive(key: &str, value: Option<usize>) -> Option<usize> {
    match value {
        Some(0) => {
            tracing::warn!("Ignoring {key} = 0; using the default");
            None
        }
        other => other,
    }
}

fn with_leading_dot(ext: &str) -> String {
    let trimmed = ext.trim();
    if trimmed.starts_with('.') {
        trimmed.to_string()
    } else {
        format!(".{trimmed}")
    }
}
