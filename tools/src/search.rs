//! Keyword scoring over the index.

use std::path::Path;

use keel_types::{Index, IndexEntry, SearchHit};

use crate::ToolError;
use crate::indexer::load_index;

/// Points awarded when a keyword appears in the path itself.
const PATH_MATCH_BONUS: u32 = 3;

/// Relevance of `entry` for already-lowercased `keywords`.
///
/// +3 per keyword found in the path, plus one per non-overlapping occurrence
/// in `path + " " + preview`.
#[must_use]
pub fn score_entry(entry: &IndexEntry, keywords: &[String]) -> u32 {
    let path = entry.path.to_lowercase();
    let text = format!("{} {}", entry.path, entry.preview).to_lowercase();
    keywords
        .iter()
        .map(|kw| {
            let bonus = if path.contains(kw.as_str()) {
                PATH_MATCH_BONUS
            } else {
                0
            };
            bonus + text.matches(kw.as_str()).count() as u32
        })
        .sum()
}

/// Top `max_results` entries for a whitespace-separated `query`.
///
/// Zero scores are dropped; ties keep index order.
#[must_use]
pub fn search(index: &Index, query: &str, max_results: usize) -> Vec<SearchHit> {
    let keywords: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
    if keywords.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = index
        .files
        .iter()
        .filter_map(|entry| {
            let score = score_entry(entry, &keywords);
            (score > 0).then(|| SearchHit {
                entry: entry.clone(),
                score,
            })
        })
        .collect();
    hits.sort_by(|a, b| b.score.cmp(&a.score));
    hits.truncate(max_results);
    hits
}

/// Load the index under `root` and search it.
pub fn search_workspace(
    root: &Path,
    index_file: &str,
    query: &str,
    max_results: usize,
) -> Result<Vec<SearchHit>, ToolError> {
    let index = load_index(root, index_file)?;
    Ok(search(&index, query, max_results))
}
