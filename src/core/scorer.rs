//! Structural path scoring
//!
//! Ranks indexed paths against a free-text query using only path structure:
//! exact name tiers, soft-AND term accumulation, in-order path sequences,
//! filename/directory specificity and a few fixed file-kind heuristics.
//! Every step is integer arithmetic so results are reproducible across shards.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::index::{PathIndex, compact_form, extension_of, normalize_separators};
use crate::core::types::{FileRecord, SearchResult, sort_and_truncate};

// Exact tiers (early return)
pub const SCORE_EXACT_FILENAME: u32 = 10_000;
pub const SCORE_EXACT_NORMALIZED: u32 = 9_500;
pub const SCORE_EXACT_STEM: u32 = 9_000;

// Soft AND
const TERM_HIT: i64 = 200;
const TERM_MISS: i64 = 300;
const BASELINE: i64 = 150;

// Path sequence
const SEQ_EXACT: i64 = 40;
const SEQ_PREFIX: i64 = 25;
const SEQ_SUBSTRING: i64 = 10;
const SEQ_STREAK_STEP: i64 = 15;
const SEQ_GAPLESS: i64 = 100;
const SEQ_SUBSTRING_MIN_LEN: usize = 4;

// Structural specificity
const STRUCT_FILENAME: i64 = 100;
const STRUCT_DIR_EXACT: i64 = 70;
const STRUCT_DIR_PARTIAL: i64 = 40;
const STRUCT_LOOSE: i64 = 10;
const STRUCT_ALL_MATCHED: i64 = 60;

const SHORT_DIR_BOOST: i64 = 2_000;
const SHORT_DIR_MAX_LEN: usize = 4;
const ADJACENCY_BONUS: i64 = 40;

const DEFINITION_BONUS: i64 = 60;
const IMPLEMENTATION_BONUS: i64 = 30;
const TEST_PENALTY: i64 = 150;

/// Extensions treated as source code.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts", ".py", ".rs", ".go", ".java",
    ".kt", ".swift", ".c", ".cc", ".cpp", ".cxx", ".h", ".hpp", ".cs", ".rb", ".php", ".scala",
    ".vue", ".svelte",
];

/// Extensions treated as markup, docs or configuration.
const MARKUP_EXTENSIONS: &[&str] = &[
    ".md", ".mdx", ".json", ".yaml", ".yml", ".toml", ".html", ".css", ".scss", ".xml", ".txt",
    ".ini", ".cfg",
];

const SOURCE_WEIGHT: i64 = 20;
const MARKUP_WEIGHT: i64 = 5;

lazy_static! {
    // Paths are matched in normalized form, so CamelCase parts are already space separated.
    static ref DEFINITION_PATTERN: Regex = Regex::new(
        r"(?:^|[/.\s])(?:models?|schemas?|entity|entities|types?|interfaces?|dtos?)(?:[/.\s]|$)"
    ).unwrap();
    static ref IMPLEMENTATION_PATTERN: Regex = Regex::new(
        r"(?:^|[/.\s])(?:services?|controllers?|handlers?|managers?)(?:[/.\s]|$)"
    ).unwrap();
    static ref TEST_PATTERN: Regex = Regex::new(
        r"(?:^|[/.\s])(?:tests?|specs?|e2e|mocks?)(?:[/.\s]|$)"
    ).unwrap();
}

fn is_known_extension(ext: &str) -> bool {
    SOURCE_EXTENSIONS.contains(&ext) || MARKUP_EXTENSIONS.contains(&ext)
}

fn extension_weight(ext: &str) -> i64 {
    if SOURCE_EXTENSIONS.contains(&ext) {
        SOURCE_WEIGHT
    } else if MARKUP_EXTENSIONS.contains(&ext) {
        MARKUP_WEIGHT
    } else {
        0
    }
}

/// A query with every derived form computed once.
#[derive(Debug, Clone)]
pub struct PreparedQuery {
    raw: String,
    normalized: String,
    terms: Vec<String>,
    sequence_terms: Vec<String>,
    has_separator: bool,
    extension_filter: Option<String>,
    compact: String,
}

impl PreparedQuery {
    pub fn new(query: &str) -> Self {
        let unified = query.trim().replace('\\', "/");
        let raw = unified.to_lowercase();
        // Normalize before lowercasing so CamelCase boundaries survive.
        let normalized = normalize_separators(&unified);
        let terms: Vec<String> = normalized.split_whitespace().map(String::from).collect();
        let sequence_terms = terms
            .iter()
            .flat_map(|t| t.split('/'))
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();
        let extension_filter = raw
            .split_whitespace()
            .map(extension_of)
            .find(|ext| is_known_extension(ext));

        Self {
            has_separator: normalized.contains('/'),
            compact: compact_form(&normalized),
            raw,
            normalized,
            terms,
            sequence_terms,
            extension_filter,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn extension_filter(&self) -> Option<&str> {
        self.extension_filter.as_deref()
    }
}

/// Quality of a term matched against one path component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ComponentMatch {
    Substring,
    Prefix,
    Exact,
}

impl ComponentMatch {
    fn bonus(self) -> i64 {
        match self {
            ComponentMatch::Exact => SEQ_EXACT,
            ComponentMatch::Prefix => SEQ_PREFIX,
            ComponentMatch::Substring => SEQ_SUBSTRING,
        }
    }
}

fn match_component(component: &str, normalized: &str, term: &str) -> Option<ComponentMatch> {
    // "router" is exact for both `router` and `router.ts`, but not for `router.test.ts`.
    let stem_exact = component
        .strip_prefix(term)
        .is_some_and(|rest| rest.starts_with('.') && !rest[1..].contains('.'));
    if component == term || stem_exact {
        return Some(ComponentMatch::Exact);
    }
    if component.starts_with(term)
        || normalized
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| !word.is_empty() && word.starts_with(term))
    {
        return Some(ComponentMatch::Prefix);
    }
    if term.len() >= SEQ_SUBSTRING_MIN_LEN && component.contains(term) {
        return Some(ComponentMatch::Substring);
    }
    None
}

/// Sum of streak bonuses for a run of `len` consecutive components.
fn streak_total(len: usize) -> i64 {
    let len = len as i64;
    SEQ_STREAK_STEP * len * (len + 1) / 2
}

/// Best in-order assignment of terms to components.
///
/// Terms may be skipped; matched components have strictly increasing indices.
/// A match directly after the previous matched component extends the streak,
/// any other match starts a new one. Skipping terms never breaks a streak, so
/// adding a term to the query can only widen the set of assignments.
fn path_sequence_bonus(record: &FileRecord, terms: &[String]) -> i64 {
    let width = record.components.len();
    if terms.is_empty() || width == 0 {
        return 0;
    }

    let matches: Vec<Vec<Option<ComponentMatch>>> = terms
        .iter()
        .map(|term| {
            record
                .components
                .iter()
                .zip(&record.components_normalized)
                .map(|(component, normalized)| match_component(component, normalized, term))
                .collect()
        })
        .collect();

    // best[idx][streak - 1]: best total whose last match is `idx` with that streak
    let max_streak = terms.len().min(width);
    let mut best: Vec<Vec<Option<i64>>> = vec![vec![None; max_streak]; width];

    for row in &matches {
        let previous = best.clone();
        // floor[idx]: best total ending strictly before component `idx`
        let mut floor = vec![0i64; width + 1];
        for (idx, states) in previous.iter().enumerate() {
            let here = states.iter().flatten().copied().max().unwrap_or(0);
            floor[idx + 1] = floor[idx].max(here);
        }

        for (idx, quality) in row.iter().enumerate() {
            let Some(quality) = quality else {
                continue;
            };
            let gain = quality.bonus();
            let start_from = floor[idx.saturating_sub(1)];
            let fresh = start_from + gain + SEQ_STREAK_STEP;
            let slot = &mut best[idx][0];
            *slot = Some(slot.map_or(fresh, |v| v.max(fresh)));

            if idx == 0 {
                continue;
            }
            for streak in 1..max_streak {
                if let Some(prev) = previous[idx - 1][streak - 1] {
                    let extended = prev + gain + (streak as i64 + 1) * SEQ_STREAK_STEP;
                    let slot = &mut best[idx][streak];
                    *slot = Some(slot.map_or(extended, |v| v.max(extended)));
                }
            }
        }
    }

    let mut bonus = best.iter().flatten().flatten().copied().max().unwrap_or(0);

    if terms.len() >= 3 && terms.len() <= width {
        for start in 0..=width - terms.len() {
            let run: Option<i64> = matches
                .iter()
                .enumerate()
                .map(|(offset, row)| row[start + offset].map(ComponentMatch::bonus))
                .sum();
            if let Some(run) = run {
                bonus = bonus.max(run + streak_total(terms.len()) + SEQ_GAPLESS);
            }
        }
    }
    bonus
}

fn filename_word_match(record: &FileRecord, term: &str) -> bool {
    record.file_name_lower.starts_with(term)
        || record
            .file_name_normalized
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| !word.is_empty() && word.starts_with(term))
}

/// Per-term preference: filename > exact parent dir > partial parent dir > anywhere.
fn structural_bonus(record: &FileRecord, terms: &[String]) -> i64 {
    let mut bonus = 0;
    let mut all_structural = true;

    for term in terms {
        let term = term.as_str();
        if filename_word_match(record, term) {
            bonus += STRUCT_FILENAME;
        } else if !record.parent.is_empty()
            && (record.parent_lower == term || record.parent_normalized == term)
        {
            bonus += STRUCT_DIR_EXACT;
        } else if !record.parent.is_empty() && record.parent_normalized.contains(term) {
            bonus += STRUCT_DIR_PARTIAL;
        } else {
            all_structural = false;
            if record.normalized.contains(term) {
                bonus += STRUCT_LOOSE;
            }
        }
    }

    if all_structural && !terms.is_empty() {
        bonus += STRUCT_ALL_MATCHED;
    }
    bonus
}

fn classification_bonus(record: &FileRecord) -> i64 {
    let mut bonus = 0;
    if DEFINITION_PATTERN.is_match(&record.normalized) {
        bonus += DEFINITION_BONUS;
    }
    if IMPLEMENTATION_PATTERN.is_match(&record.normalized) {
        bonus += IMPLEMENTATION_BONUS;
    }
    if TEST_PATTERN.is_match(&record.normalized) {
        bonus -= TEST_PENALTY;
    }
    bonus
}

/// Scores one record. Returns 0 for records that should not be listed.
pub fn score_entry(record: &FileRecord, query: &PreparedQuery) -> u32 {
    if query.is_empty() {
        return 0;
    }

    if record.file_name_lower == query.raw {
        return SCORE_EXACT_FILENAME;
    }
    if record.file_name_normalized == query.normalized {
        return SCORE_EXACT_NORMALIZED;
    }
    let stem = record.stem_lower();
    if !stem.is_empty() && stem == query.raw {
        return SCORE_EXACT_STEM;
    }

    if query
        .extension_filter
        .as_deref()
        .is_some_and(|ext| record.extension != ext)
    {
        return 0;
    }

    let mut score = BASELINE;
    for term in &query.terms {
        if record.normalized.contains(term.as_str()) {
            score += TERM_HIT;
        } else {
            score -= TERM_MISS;
        }
    }

    if query.terms.len() >= 3 || query.has_separator {
        score += path_sequence_bonus(record, &query.sequence_terms);
    }

    score += structural_bonus(record, &query.terms);

    if let [term] = query.terms.as_slice() {
        let hits_component = record
            .components
            .iter()
            .any(|c| c == term || c.rsplit_once('.').is_some_and(|(stem, _)| stem == term));
        if term.len() <= SHORT_DIR_MAX_LEN && hits_component {
            score += SHORT_DIR_BOOST;
        }
    }

    if !query.compact.is_empty() && record.compact.contains(&query.compact) {
        score += ADJACENCY_BONUS;
    }

    score += extension_weight(&record.extension);
    score += classification_bonus(record);

    score.max(0) as u32
}

impl PathIndex {
    /// Returns up to `limit` records with a positive score, best first.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        let prepared = PreparedQuery::new(query);
        if prepared.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = self
            .records()
            .iter()
            .filter_map(|record| {
                let score = score_entry(record, &prepared);
                (score > 0).then(|| SearchResult::new(record.path.clone(), score))
            })
            .collect();

        sort_and_truncate(&mut results, limit);
        results
    }
}

/// Free-function form of [`PathIndex::search`].
pub fn search(index: &PathIndex, query: &str, limit: usize) -> Vec<SearchResult> {
    index.search(query, limit)
}
