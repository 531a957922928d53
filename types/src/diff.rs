//! Line diff records produced by the greedy differ.

use serde::{Deserialize, Serialize};

/// A single aligned line of a diff.
///
/// Line numbers are 1-based. Serialized with a `type` tag and camelCase
/// fields (`oldLine`, `newLine`, `oldContent`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DiffLine {
    Same {
        #[serde(rename = "oldLine")]
        old_line: usize,
        #[serde(rename = "newLine")]
        new_line: usize,
        content: String,
    },
    Add {
        #[serde(rename = "newLine")]
        new_line: usize,
        content: String,
    },
    Remove {
        #[serde(rename = "oldLine")]
        old_line: usize,
        content: String,
    },
    /// A paired replacement: `old_content` on the old side, `content` on the new.
    Change {
        #[serde(rename = "oldLine")]
        old_line: usize,
        #[serde(rename = "newLine")]
        new_line: usize,
        #[serde(rename = "oldContent")]
        old_content: String,
        content: String,
    },
}

impl DiffLine {
    #[must_use]
    pub fn old_line(&self) -> Option<usize> {
        match self {
            Self::Same { old_line, .. }
            | Self::Remove { old_line, .. }
            | Self::Change { old_line, .. } => Some(*old_line),
            Self::Add { .. } => None,
        }
    }

    #[must_use]
    pub fn new_line(&self) -> Option<usize> {
        match self {
            Self::Same { new_line, .. }
            | Self::Add { new_line, .. }
            | Self::Change { new_line, .. } => Some(*new_line),
            Self::Remove { .. } => None,
        }
    }

    /// Content as it appears on the old side, if this record has one.
    #[must_use]
    pub fn old_content(&self) -> Option<&str> {
        match self {
            Self::Same { content, .. } | Self::Remove { content, .. } => Some(content),
            Self::Change { old_content, .. } => Some(old_content),
            Self::Add { .. } => None,
        }
    }

    /// Content as it appears on the new side, if this record has one.
    #[must_use]
    pub fn new_content(&self) -> Option<&str> {
        match self {
            Self::Same { content, .. }
            | Self::Add { content, .. }
            | Self::Change { content, .. } => Some(content),
            Self::Remove { .. } => None,
        }
    }
}

/// Per-type tally of diff records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    /// Counts `change` records, not add/remove pairs.
    pub changed: usize,
    pub same: usize,
}

impl DiffSummary {
    #[must_use]
    pub fn tally(lines: &[DiffLine]) -> Self {
        let mut summary = Self::default();
        for line in lines {
            match line {
                DiffLine::Same { .. } => summary.same += 1,
                DiffLine::Add { .. } => summary.added += 1,
                DiffLine::Remove { .. } => summary.removed += 1,
                DiffLine::Change { .. } => summary.changed += 1,
            }
        }
        summary
    }

    /// True when anything was added, removed, or changed.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0 || self.changed > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    pub lines: Vec<DiffLine>,
    pub summary: DiffSummary,
}

impl DiffResult {
    #[must_use]
    pub fn new(lines: Vec<DiffLine>) -> Self {
        let summary = DiffSummary::tally(&lines);
        Self { lines, summary }
    }

    /// Rebuild the old text from records that carry an old line.
    #[must_use]
    pub fn old_text(&self) -> String {
        join_lines(self.lines.iter().filter_map(DiffLine::old_content))
    }

    /// Rebuild the new text from records that carry a new line.
    #[must_use]
    pub fn new_text(&self) -> String {
        join_lines(self.lines.iter().filter_map(DiffLine::new_content))
    }
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>) -> String {
    lines.collect::<Vec<_>>().join("\n")
}
