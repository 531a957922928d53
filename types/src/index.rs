//! Persisted workspace index and ranked search hits.

use serde::{Deserialize, Serialize};

/// One indexed file: where it lives, how big it is, and a bounded preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Workspace-relative path with forward slashes.
    pub path: String,
    /// File size in bytes.
    pub size: u64,
    /// First lines of the file, trailing whitespace trimmed.
    pub preview: String,
}

/// The on-disk index document.
///
/// Regenerated wholesale on every scan; there is no incremental update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    /// ISO-8601 timestamp of the scan.
    pub generated: String,
    /// Absolute path that was scanned.
    pub root: String,
    /// Number of entries in `files`.
    pub count: usize,
    pub files: Vec<IndexEntry>,
}

impl Index {
    #[must_use]
    pub fn new(generated: String, root: String, files: Vec<IndexEntry>) -> Self {
        Self {
            generated,
            root,
            count: files.len(),
            files,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// An index entry with its relevance score for a query.
///
/// Serializes flat: `{path, size, preview, score}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub entry: IndexEntry,
    pub score: u32,
}

impl SearchHit {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.entry.path
    }
}
