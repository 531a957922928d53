//! Read-only heuristic analysis over index previews.
//!
//! The analyzer never opens workspace files; it only inspects the previews the
//! index already holds for the top search hits.

use std::sync::OnceLock;

use keel_tools::search;
use keel_types::{AnalysisReport, Finding, FindingKind, Index, SearchHit};
use regex::Regex;
use tracing::debug;

use crate::keywords::{ANALYZER_STOP_WORDS, extract_keywords};

const LONG_LINE_CHARS: usize = 120;
const LONG_LINE_THRESHOLD: usize = 2;

static LOOP_HEADER: OnceLock<Regex> = OnceLock::new();

fn loop_header() -> &'static Regex {
    LOOP_HEADER.get_or_init(|| Regex::new(r"for\s*\(").expect("valid loop header regex"))
}

/// Top search hits for the keywords of `question`; none when only stop words remain.
#[must_use]
pub fn relevant_files(question: &str, index: &Index, max_results: usize) -> Vec<SearchHit> {
    let keywords = extract_keywords(question, ANALYZER_STOP_WORDS);
    if keywords.is_empty() {
        return Vec::new();
    }
    let hits = search(index, &keywords.join(" "), max_results);
    debug!(keywords = ?keywords, hits = hits.len(), "Relevant files");
    hits
}

/// Answer `question` with findings for the most relevant indexed files.
#[must_use]
pub fn analyze(question: &str, index: &Index, max_results: usize) -> AnalysisReport {
    let hits = relevant_files(question, index, max_results);

    if hits.is_empty() {
        return AnalysisReport {
            question: question.to_string(),
            files: Vec::new(),
            findings: vec![Finding::info(
                "no relevant files found; run `keel index` to refresh the index",
            )],
        };
    }

    let mut findings: Vec<Finding> = hits.iter().flat_map(inspect).collect();
    if findings.is_empty() {
        findings.push(Finding::info("no obvious issues in analyzed files"));
    }

    AnalysisReport {
        question: question.to_string(),
        files: hits.iter().map(|hit| hit.path().to_string()).collect(),
        findings,
    }
}

/// Heuristic findings for one preview, in a fixed order.
fn inspect(hit: &SearchHit) -> Vec<Finding> {
    let path = hit.path();
    let preview = hit.entry.preview.as_str();
    let mut findings = Vec::new();

    if preview.contains("TODO") || preview.contains("FIXME") {
        findings.push(Finding::new(
            FindingKind::Organization,
            path,
            "TODO/FIXME marker found",
        ));
    }
    if preview.contains("eval(") || preview.contains("exec(") {
        findings.push(Finding::new(FindingKind::Security, path, "eval/exec call"));
    }
    if preview.contains("password") && preview.contains('=') && !preview.contains("env") {
        findings.push(Finding::new(
            FindingKind::Security,
            path,
            "possible plaintext password",
        ));
    }
    if loop_header().find_iter(preview).count() >= 2 {
        findings.push(Finding::new(FindingKind::Performance, path, "nested loops"));
    }
    let long_lines = preview
        .split('\n')
        .filter(|line| line.chars().count() > LONG_LINE_CHARS)
        .count();
    if long_lines > LONG_LINE_THRESHOLD {
        findings.push(Finding::new(FindingKind::Readability, path, "very long lines"));
    }

    findings
}

/// The previews of `hits` as one prompt-sized text block.
///
/// Each file is introduced by `--- <path> (<size> bytes) ---`; blocks are
/// separated by a blank line.
#[must_use]
pub fn build_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| {
            format!(
                "--- {} ({} bytes) ---\n{}",
                hit.path(),
                hit.entry.size,
                hit.entry.preview
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
