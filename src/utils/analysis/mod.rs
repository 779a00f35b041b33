//! Analysis utilities for code intelligence
//!
//! Contains import extraction, the dependency graph, import ranking and impact analysis.

pub mod dependencies;
pub mod graph;
pub mod impact;
pub mod imports;
pub mod rank;

// Re-export commonly used items
pub use dependencies::{
    GraphBuilder, build_dependency_graph, is_external_specifier, resolve_import_path,
};
pub use graph::{DependencyGraph, FileNode};
pub use impact::{
    BlastRadius, ImpactAnalysis, ImpactAnalyzer, MultiImpact, analyze_impact,
    analyze_multiple_impacts,
};
pub use imports::{ImportEdge, extract_exports, extract_imports};
pub use rank::calculate_import_ranks;
