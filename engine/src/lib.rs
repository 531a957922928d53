//! Orchestration for Keel: the modification agent and the heuristic analyzer.
//!
//! Both build on the tools crate. The agent drives a [`FileStore`] through a
//! fixed phase sequence; the analyzer only reads the index.
//!
//! [`FileStore`]: keel_tools::FileStore

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Static regexes are literals

mod agent;
mod analyzer;
mod keywords;
mod modifications;

pub use agent::{
    Agent, AgentError, AgentOptions, AgentOutcome, AgentPhase, AgentReport, AutoConfirm,
    Confirmer, FileOutcome, FileReport, PromptConfirmer,
};
pub use analyzer::{analyze, build_context, relevant_files};
pub use keywords::{AGENT_STOP_WORDS, ANALYZER_STOP_WORDS, extract_keywords};
pub use modifications::{ModificationsError, load_modifications};
