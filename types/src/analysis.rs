//! Heuristic analysis report.
//!
//! Field names are part of the JSON contract consumed by the frontend, which
//! is why they stay in Portuguese (`pergunta`, `arquivos_analisados`, `resumo`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    #[serde(rename = "organização")]
    Organization,
    #[serde(rename = "segurança")]
    Security,
    #[serde(rename = "performance")]
    Performance,
    #[serde(rename = "legibilidade")]
    Readability,
    #[serde(rename = "info")]
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "tipo")]
    pub kind: FindingKind,
    /// Workspace-relative path, or `-` for report-wide notes.
    #[serde(rename = "arquivo")]
    pub file: String,
    #[serde(rename = "nota")]
    pub note: String,
}

impl Finding {
    #[must_use]
    pub fn new(kind: FindingKind, file: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
            note: note.into(),
        }
    }

    /// A report-wide informational note not tied to any file.
    #[must_use]
    pub fn info(note: impl Into<String>) -> Self {
        Self::new(FindingKind::Info, "-", note)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(rename = "pergunta")]
    pub question: String,
    #[serde(rename = "arquivos_analisados")]
    pub files: Vec<String>,
    /// Never empty: holds at least one `info` entry.
    #[serde(rename = "resumo")]
    pub findings: Vec<Finding>,
}
