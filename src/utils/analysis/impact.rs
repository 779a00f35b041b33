//! Impact analysis for file changes
//!
//! Estimates how far a change to one file reaches by walking the reverse
//! dependency lookup, and pairs the result with the tests that cover the file.

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::graph::{DependencyGraph, graph_key};

const DIRECT_WEIGHT: usize = 3;
const INDIRECT_WEIGHT: usize = 1;

const MEDIUM_THRESHOLD: usize = 5;
const LARGE_THRESHOLD: usize = 15;
const CRITICAL_THRESHOLD: usize = 40;

const TEST_DIRECTORIES: &[&str] = &["__tests__", "test", "tests"];

/// Step classification of the weighted dependent count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlastRadius {
    Small,
    Medium,
    Large,
    Critical,
}

impl BlastRadius {
    pub fn from_score(score: usize) -> Self {
        if score < MEDIUM_THRESHOLD {
            BlastRadius::Small
        } else if score < LARGE_THRESHOLD {
            BlastRadius::Medium
        } else if score < CRITICAL_THRESHOLD {
            BlastRadius::Large
        } else {
            BlastRadius::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BlastRadius::Small => "small",
            BlastRadius::Medium => "medium",
            BlastRadius::Large => "large",
            BlastRadius::Critical => "critical",
        }
    }
}

/// Impact of changing a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactAnalysis {
    pub file: String,
    pub blast_radius: BlastRadius,
    /// Weighted dependent count
    pub score: usize,
    /// Files importing the target, sorted
    pub direct_dependents: Vec<String>,
    /// Files importing a direct dependent, sorted
    pub indirect_dependents: Vec<String>,
    pub related_tests: Vec<String>,
    pub warnings: Vec<String>,
}

impl std::fmt::Display for ImpactAnalysis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Impact of {}", self.file)?;
        writeln!(
            f,
            "Blast radius: {} (score {})",
            self.blast_radius.as_str(),
            self.score
        )?;

        writeln!(f, "Direct dependents: {}", self.direct_dependents.len())?;
        for file in self.direct_dependents.iter().take(10) {
            writeln!(f, "  -> {}", file)?;
        }
        if self.direct_dependents.len() > 10 {
            writeln!(f, "  ... and {} more", self.direct_dependents.len() - 10)?;
        }
        writeln!(f, "Indirect dependents: {}", self.indirect_dependents.len())?;

        if !self.related_tests.is_empty() {
            writeln!(f, "Related tests:")?;
            for test in &self.related_tests {
                writeln!(f, "  * {}", test)?;
            }
        }

        for warning in &self.warnings {
            writeln!(f, "warning: {}", warning)?;
        }
        Ok(())
    }
}

/// Aggregate over several analyzed files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiImpact {
    pub analyses: BTreeMap<String, ImpactAnalysis>,
    pub max_blast_radius: BlastRadius,
    pub total_direct_dependents: usize,
}

fn split_name(path: &str) -> (&str, &str) {
    path.rsplit_once('/').unwrap_or(("", path))
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => &file_name[..idx],
        _ => file_name,
    }
}

/// True when `candidate` follows a test naming convention for `stem`.
fn is_test_for(stem: &str, candidate: &str) -> bool {
    let (dir, name) = split_name(candidate);
    let name = name.to_lowercase();

    let named = [
        format!("{stem}.test."),
        format!("{stem}.spec."),
        format!("{stem}_test."),
        format!("{stem}-test."),
        format!("test_{stem}."),
    ];
    if named.iter().any(|prefix| name.starts_with(prefix.as_str())) {
        return true;
    }

    name.starts_with(&format!("{stem}."))
        && dir
            .split('/')
            .any(|c| TEST_DIRECTORIES.contains(&c.to_lowercase().as_str()))
}

/// Impact analyzer over a built dependency graph
pub struct ImpactAnalyzer<'a> {
    graph: &'a DependencyGraph,
}

impl<'a> ImpactAnalyzer<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self { graph }
    }

    /// Analyze the impact of changing `file`.
    pub fn analyze<S: AsRef<str>>(&self, file: &str, all_files: &[S]) -> ImpactAnalysis {
        let file = graph_key(file);

        let direct: BTreeSet<String> = self
            .graph
            .dependents_of(&file)
            .into_iter()
            .map(String::from)
            .collect();

        let mut indirect = BTreeSet::new();
        for dependent in &direct {
            for upstream in self.graph.dependents_of(dependent) {
                if upstream != file && !direct.contains(upstream) {
                    indirect.insert(upstream.to_string());
                }
            }
        }

        let related_tests = self.find_related_tests(&file, all_files);

        let score = DIRECT_WEIGHT * direct.len() + INDIRECT_WEIGHT * indirect.len();
        let blast_radius = BlastRadius::from_score(score);

        let mut warnings = Vec::new();
        if !direct.is_empty() && related_tests.is_empty() {
            warnings.push(format!(
                "{} file(s) depend on {} but no related tests were found",
                direct.len(),
                file
            ));
        }
        if blast_radius == BlastRadius::Critical {
            warnings.push(format!(
                "critical blast radius: weighted dependent count {} (>= {})",
                score, CRITICAL_THRESHOLD
            ));
        }

        ImpactAnalysis {
            file,
            blast_radius,
            score,
            direct_dependents: direct.into_iter().collect(),
            indirect_dependents: indirect.into_iter().collect(),
            related_tests,
            warnings,
        }
    }

    /// Files other than `file` named like a test for it, sorted.
    fn find_related_tests<S: AsRef<str>>(&self, file: &str, all_files: &[S]) -> Vec<String> {
        let stem = file_stem(split_name(file).1).to_lowercase();
        if stem.is_empty() {
            return Vec::new();
        }

        let tests: BTreeSet<String> = all_files
            .iter()
            .map(|f| graph_key(f.as_ref()))
            .filter(|candidate| candidate != file && is_test_for(&stem, candidate))
            .collect();
        tests.into_iter().collect()
    }

    /// Every file reaching `file` through at most `max_depth` import hops, sorted.
    pub fn transitive_dependents(&self, file: &str, max_depth: usize) -> Vec<String> {
        let start = graph_key(file);
        let mut visited: HashSet<String> = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        let mut reached = BTreeSet::new();

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for dependent in self.graph.dependents_of(&current) {
                if visited.insert(dependent.to_string()) {
                    reached.insert(dependent.to_string());
                    queue.push_back((dependent.to_string(), depth + 1));
                }
            }
        }

        reached.into_iter().collect()
    }
}

/// Free-function form of [`ImpactAnalyzer::analyze`].
pub fn analyze_impact<S: AsRef<str>>(
    file: &str,
    graph: &DependencyGraph,
    all_files: &[S],
) -> ImpactAnalysis {
    ImpactAnalyzer::new(graph).analyze(file, all_files)
}

/// Analyzes each file and aggregates the worst radius and total direct dependents.
pub fn analyze_multiple_impacts<F: AsRef<str>, S: AsRef<str>>(
    files: &[F],
    graph: &DependencyGraph,
    all_files: &[S],
) -> MultiImpact {
    let analyzer = ImpactAnalyzer::new(graph);
    let analyses: BTreeMap<String, ImpactAnalysis> = files
        .iter()
        .map(|f| {
            let analysis = analyzer.analyze(f.as_ref(), all_files);
            (analysis.file.clone(), analysis)
        })
        .collect();

    let max_blast_radius = analyses
        .values()
        .map(|a| a.blast_radius)
        .max()
        .unwrap_or(BlastRadius::Small);
    let total_direct_dependents = analyses.values().map(|a| a.direct_dependents.len()).sum();

    MultiImpact {
        analyses,
        max_blast_radius,
        total_direct_dependents,
    }
}
