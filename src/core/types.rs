//! Core types shared across the search modules

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Scores strictly above this value are reported as exact matches.
pub const EXACT_MATCH_THRESHOLD: u32 = 5000;

/// How a search result matched the query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Fuzzy,
}

impl MatchType {
    pub fn from_score(score: u32) -> Self {
        if score > EXACT_MATCH_THRESHOLD {
            MatchType::Exact
        } else {
            MatchType::Fuzzy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Exact => "exact",
            MatchType::Fuzzy => "fuzzy",
        }
    }
}

/// A single ranked file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub path: String,
    pub score: u32,
    pub match_type: MatchType,
}

impl SearchResult {
    pub fn new(path: impl Into<String>, score: u32) -> Self {
        Self {
            path: path.into(),
            score,
            match_type: MatchType::from_score(score),
        }
    }
}

impl std::fmt::Display for SearchResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (score={}, {})",
            self.path,
            self.score,
            self.match_type.as_str()
        )
    }
}

/// Global result order: score descending, then shorter path, then path text.
///
/// The final lexicographic key makes the order total, so merging shard-local
/// results reproduces the unsharded ranking exactly.
pub fn compare_results(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.path.len().cmp(&b.path.len()))
        .then_with(|| a.path.cmp(&b.path))
}

/// Sorts in place with [`compare_results`] and keeps the first `limit` entries.
pub fn sort_and_truncate(results: &mut Vec<SearchResult>, limit: usize) {
    results.sort_by(compare_results);
    results.truncate(limit);
}

/// Precomputed structural view of one indexed path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: String,
    pub lower: String,
    pub normalized: String,
    pub file_name: String,
    pub file_name_lower: String,
    pub file_name_normalized: String,
    pub parent: String,
    pub parent_lower: String,
    pub parent_normalized: String,
    pub components: Vec<String>,
    pub components_normalized: Vec<String>,
    /// Normalized path with spaces and separators removed
    pub compact: String,
    pub extension: String,
    pub depth: usize,
}

impl FileRecord {
    /// Lowercase file name without its extension.
    pub fn stem_lower(&self) -> &str {
        let len = self.file_name_lower.len() - self.extension.len();
        &self.file_name_lower[..len]
    }
}
