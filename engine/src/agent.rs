//! Agent orchestrator: find relevant files, preview diffs, apply on confirmation.
//!
//! One invocation walks a fixed sequence of phases (see [`AgentPhase`]). The
//! agent never invents content; modifications come from a payload file and are
//! applied only after the per-file diff has been confirmed, either interactively
//! or through auto-confirm. Every write goes through [`FileStore::write`], so a
//! backup always precedes an overwrite.

use std::io::{self, BufRead, Write};
use std::path::Path;

use keel_tools::config::{DEFAULT_INDEX_FILE, DEFAULT_MAX_RESULTS};
use keel_tools::{FileStore, ToolError, search_workspace};
use keel_types::{MalformedModification, Modification, NonEmptyString, SearchHit};
use keel_utils::{diff_lines, render_diff};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::keywords::{AGENT_STOP_WORDS, extract_keywords};
use crate::modifications::{ModificationsError, load_modifications};

const BANNER_WIDTH: usize = 60;

/// Where an agent run currently is.
///
/// `Idle → KeywordsExtracted → FilesFound → (AwaitingModifications |
/// NoModifications)`, then for each entry `ReadOld → Diffed →
/// (AwaitingConfirm → Applied | Skipped) | NoChange`, and finally `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    Idle,
    KeywordsExtracted,
    FilesFound,
    AwaitingModifications,
    NoModifications,
    ReadOld,
    Diffed,
    AwaitingConfirm,
    Applied,
    Skipped,
    NoChange,
    Done,
}

/// Answers the per-file "apply this?" question.
pub trait Confirmer {
    fn confirm(&mut self, path: &str) -> io::Result<bool>;
}

/// Reads one answer line per question. End of input means no.
#[derive(Debug)]
pub struct PromptConfirmer<R> {
    input: R,
}

impl<R: BufRead> PromptConfirmer<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl<R: BufRead> Confirmer for PromptConfirmer<R> {
    fn confirm(&mut self, _path: &str) -> io::Result<bool> {
        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        Ok(is_affirmative(&answer))
    }
}

/// Says yes to everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&mut self, _path: &str) -> io::Result<bool> {
        Ok(true)
    }
}

fn is_affirmative(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "s" | "sim"
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    pub index_file: String,
    pub max_results: usize,
    /// Apply every changed entry without showing the diff or asking.
    pub auto_confirm: bool,
}

impl Default for AgentOptions {
    fn default() -> Self {
        Self {
            index_file: DEFAULT_INDEX_FILE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            auto_confirm: false,
        }
    }
}

/// What happened to one entry of the modification batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Applied { backup: Option<String> },
    Declined,
    Unchanged,
    Denied { reason: String },
    Malformed(MalformedModification),
    ReadFailed { message: String },
    WriteFailed { message: String },
}

impl FileOutcome {
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::Denied { .. }
                | Self::Malformed(_)
                | Self::ReadFailed { .. }
                | Self::WriteFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// `None` when the entry carried no usable path.
    pub path: Option<String>,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentOutcome {
    NoRelevantFiles,
    /// Candidates were listed but no payload was given.
    Preview,
    /// The payload held no entries.
    InvalidModifications,
    Completed {
        applied: usize,
        files: Vec<FileReport>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReport {
    pub keywords: Vec<String>,
    pub candidates: Vec<SearchHit>,
    pub outcome: AgentOutcome,
}

impl AgentReport {
    #[must_use]
    pub fn applied(&self) -> usize {
        match &self.outcome {
            AgentOutcome::Completed { applied, .. } => *applied,
            _ => 0,
        }
    }

    /// True when the payload was empty, or every entry of it failed.
    #[must_use]
    pub fn failed(&self) -> bool {
        match &self.outcome {
            AgentOutcome::InvalidModifications => true,
            AgentOutcome::Completed { files, .. } => {
                !files.is_empty() && files.iter().all(|f| f.outcome.is_failure())
            }
            AgentOutcome::NoRelevantFiles | AgentOutcome::Preview => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Modifications(#[from] ModificationsError),
    #[error("failed to write agent output: {0}")]
    Output(#[source] io::Error),
}

pub struct Agent<'a> {
    store: &'a FileStore,
    options: AgentOptions,
    phase: AgentPhase,
}

impl<'a> Agent<'a> {
    #[must_use]
    pub fn new(store: &'a FileStore, options: AgentOptions) -> Self {
        Self {
            store,
            options,
            phase: AgentPhase::Idle,
        }
    }

    #[must_use]
    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    fn enter(&mut self, phase: AgentPhase) {
        debug!(from = ?self.phase, to = ?phase, "Agent phase");
        self.phase = phase;
    }

    /// Run one instruction end to end.
    ///
    /// Without `modifications` the run stops after listing candidates. A
    /// missing index or an unreadable payload is an error; per-entry problems
    /// are reported in [`AgentOutcome::Completed`] and the batch continues.
    pub fn run(
        &mut self,
        instruction: &NonEmptyString,
        modifications: Option<&Path>,
        confirmer: &mut dyn Confirmer,
        out: &mut dyn Write,
    ) -> Result<AgentReport, AgentError> {
        self.phase = AgentPhase::Idle;
        self.store.log("AGENT_START", instruction.as_str())?;

        let keywords = extract_keywords(instruction.as_str(), AGENT_STOP_WORDS);
        self.enter(AgentPhase::KeywordsExtracted);

        let candidates = if keywords.is_empty() {
            Vec::new()
        } else {
            search_workspace(
                self.store.root(),
                &self.options.index_file,
                &keywords.join(" "),
                self.options.max_results,
            )?
        };

        if candidates.is_empty() {
            emit(
                out,
                "No relevant files found. Run `keel index` to refresh the index.",
            )?;
            self.store.log("AGENT_END", "no files")?;
            self.enter(AgentPhase::Done);
            return Ok(AgentReport {
                keywords,
                candidates,
                outcome: AgentOutcome::NoRelevantFiles,
            });
        }
        self.enter(AgentPhase::FilesFound);

        emit(out, "\nRelevant files:")?;
        for (n, hit) in candidates.iter().enumerate() {
            emit(out, &format!("  {}. {} (score: {})", n + 1, hit.path(), hit.score))?;
        }

        let Some(payload) = modifications else {
            self.enter(AgentPhase::NoModifications);
            emit(out, "\nTo apply modifications, write a JSON file shaped like:")?;
            emit(out, r#"  [{ "path": "relative/file", "content": "new content" }]"#)?;
            emit(
                out,
                "Then run: keel agent \"<instruction>\" --apply modifications.json",
            )?;
            self.store.log("AGENT_END", "no modifications")?;
            self.enter(AgentPhase::Done);
            return Ok(AgentReport {
                keywords,
                candidates,
                outcome: AgentOutcome::Preview,
            });
        };
        self.enter(AgentPhase::AwaitingModifications);

        let entries = match load_modifications(payload) {
            Ok(entries) => entries,
            Err(e) => {
                emit(out, &format!("Modifications file is invalid: {e}"))?;
                self.store.log("AGENT_END", "invalid modifications")?;
                self.enter(AgentPhase::Done);
                return Err(e.into());
            }
        };
        if entries.is_empty() {
            emit(out, "Modifications file is invalid or empty.")?;
            self.store.log("AGENT_END", "invalid modifications")?;
            self.enter(AgentPhase::Done);
            return Ok(AgentReport {
                keywords,
                candidates,
                outcome: AgentOutcome::InvalidModifications,
            });
        }

        let mut files = Vec::with_capacity(entries.len());
        for entry in &entries {
            files.push(self.apply_entry(entry, confirmer, out)?);
        }
        let applied = files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::Applied { .. }))
            .count();

        emit(out, &format!("\nModifications applied: {applied}"))?;
        self.store.log("AGENT_END", &format!("applied={applied}"))?;
        self.enter(AgentPhase::Done);
        info!(applied, total = files.len(), "Agent run finished");

        Ok(AgentReport {
            keywords,
            candidates,
            outcome: AgentOutcome::Completed { applied, files },
        })
    }

    fn apply_entry(
        &mut self,
        entry: &Value,
        confirmer: &mut dyn Confirmer,
        out: &mut dyn Write,
    ) -> Result<FileReport, AgentError> {
        let modification = match Modification::try_from(entry) {
            Ok(modification) => modification,
            Err(e) => {
                warn!("Malformed modification: {e}");
                emit(
                    out,
                    &format!("Invalid modification (missing path or content): {entry}"),
                )?;
                return Ok(FileReport {
                    path: entry
                        .get("path")
                        .or_else(|| entry.get("file"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    outcome: FileOutcome::Malformed(e),
                });
            }
        };
        let path = modification.path.clone();
        let report = |outcome| FileReport {
            path: Some(path.clone()),
            outcome,
        };

        if let Err(e) = self.store.sandbox().validate(&path) {
            emit(out, &format!("Access denied: {path} ({e})"))?;
            self.store.log("AGENT_DENIED", &path)?;
            return Ok(report(FileOutcome::Denied {
                reason: e.to_string(),
            }));
        }

        self.enter(AgentPhase::ReadOld);
        let old = match self.store.read(&path) {
            Ok(content) => content,
            Err(ToolError::NotFound { .. }) => String::new(),
            Err(e) => {
                emit(out, &format!("Read error: {path}: {e}"))?;
                self.store.log("AGENT_ERROR", &format!("{path}: {e}"))?;
                return Ok(report(FileOutcome::ReadFailed {
                    message: e.to_string(),
                }));
            }
        };

        let diff = diff_lines(&old, &modification.content);
        self.enter(AgentPhase::Diffed);
        if !diff.summary.has_changes() {
            self.enter(AgentPhase::NoChange);
            emit(out, &format!("No changes in: {path}"))?;
            return Ok(report(FileOutcome::Unchanged));
        }

        let confirmed = if self.options.auto_confirm {
            true
        } else {
            self.enter(AgentPhase::AwaitingConfirm);
            let rule = "=".repeat(BANNER_WIDTH);
            emit(out, &format!("\n{rule}\nFile: {path}\n{rule}"))?;
            emit(out, &render_diff(&diff, Some(&path)))?;
            emit(out, "")?;
            write!(out, "Apply this modification? (y/n): ").map_err(AgentError::Output)?;
            out.flush().map_err(AgentError::Output)?;
            confirmer.confirm(&path).map_err(AgentError::Output)?
        };

        if !confirmed {
            self.enter(AgentPhase::Skipped);
            emit(out, &format!("Skipped: {path}"))?;
            self.store.log("AGENT_SKIP", &path)?;
            return Ok(report(FileOutcome::Declined));
        }

        match self.store.write(&path, &modification.content) {
            Ok(outcome) => {
                self.enter(AgentPhase::Applied);
                emit(out, &format!("Applied: {path}"))?;
                self.store.log("AGENT_APPLY", &path)?;
                Ok(report(FileOutcome::Applied {
                    backup: outcome.backup,
                }))
            }
            Err(e) => {
                emit(out, &format!("Write error: {path}: {e}"))?;
                self.store.log("AGENT_ERROR", &format!("{path}: {e}"))?;
                Ok(report(FileOutcome::WriteFailed {
                    message: e.to_string(),
                }))
            }
        }
    }
}

fn emit(out: &mut dyn Write, line: &str) -> Result<(), AgentError> {
    writeln!(out, "{line}").map_err(AgentError::Output)
}
