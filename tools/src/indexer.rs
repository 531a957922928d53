//! Workspace indexer: path, size and a short preview for every source file.
//!
//! The index is the token-cheap stand-in for the codebase. Search and the
//! agent only ever look at previews, never at full file contents.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use ignore::WalkBuilder;
use keel_types::{Index, IndexEntry};
use keel_utils::atomic_write;
use tracing::{debug, info};

use crate::ToolError;
use crate::config::IndexerConfig;

#[derive(Debug, Clone, Default)]
pub struct Indexer {
    config: IndexerConfig,
}

impl Indexer {
    #[must_use]
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Scan `root` into a fresh index. Unreadable entries are skipped.
    #[must_use]
    pub fn build(&self, root: &Path) -> Index {
        let ignore_dirs: Vec<String> = self
            .config
            .ignore_dirs
            .iter()
            .map(|d| d.to_lowercase())
            .collect();

        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_some_and(|t| t.is_dir()) {
                    return true;
                }
                let name = entry.file_name().to_string_lossy().to_lowercase();
                !ignore_dirs.contains(&name)
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
            if !entry.file_type().is_some_and(|t| t.is_file()) || !self.should_index(entry.path()) {
                continue;
            }
            match self.entry_for(root, entry.path()) {
                Ok(indexed) => files.push(indexed),
                Err(e) => debug!(path = %entry.path().display(), "Skipping file: {e}"),
            }
        }

        let generated = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        Index::new(generated, root.to_string_lossy().into_owned(), files)
    }

    /// Write `index` as compact JSON to `<root>/<file_name>`, replacing any previous one.
    pub fn persist(&self, root: &Path, index: &Index) -> Result<PathBuf, ToolError> {
        let path = index_path(root, &self.config.file_name);
        let json = serde_json::to_vec(index).map_err(|e| ToolError::BadArgs {
            message: format!("failed to serialize index: {e}"),
        })?;
        atomic_write(&path, &json).map_err(|e| ToolError::write_failed(&path, e))?;
        info!(path = %path.display(), count = index.count, "Index written");
        Ok(path)
    }

    pub fn build_and_persist(&self, root: &Path) -> Result<(Index, PathBuf), ToolError> {
        let index = self.build(root);
        let path = self.persist(root, &index)?;
        Ok((index, path))
    }

    fn should_index(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
            return false;
        };
        if name == self.config.file_name {
            return false;
        }
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_lowercase()) else {
            return false;
        };
        self.config
            .extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(&ext))
    }

    fn entry_for(&self, root: &Path, path: &Path) -> std::io::Result<IndexEntry> {
        let size = fs::metadata(path)?.len();
        let preview = read_preview(path, self.config.preview_lines)?;
        let rel = path.strip_prefix(root).unwrap_or(path);
        Ok(IndexEntry {
            path: rel.to_string_lossy().replace('\\', "/"),
            size,
            preview,
        })
    }
}

/// First `lines` lines, CRLF-normalized, trailing whitespace trimmed.
fn read_preview(path: &Path, lines: usize) -> std::io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut kept = Vec::with_capacity(lines);
    let mut buf = Vec::new();
    while kept.len() < lines {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        kept.push(line.trim_end_matches('\n').trim_end_matches('\r').to_string());
    }
    Ok(kept.join("\n").trim_end().to_string())
}

#[must_use]
pub fn index_path(root: &Path, file_name: &str) -> PathBuf {
    root.join(file_name)
}

/// Load a persisted index.
///
/// A missing file is [`ToolError::IndexMissing`], which callers report as
/// "run `keel index` first" rather than as a failure.
pub fn load_index(root: &Path, file_name: &str) -> Result<Index, ToolError> {
    let path = index_path(root, file_name);
    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::IndexMissing { path });
        }
        Err(e) => return Err(ToolError::io(&path, e)),
    };
    serde_json::from_slice(&raw).map_err(|source| ToolError::IndexCorrupt { path, source })
}
