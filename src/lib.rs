pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod utils;

// Re-export key items for convenience
pub use config::{AliasRule, EngineConfig, GraphConfig, SearchConfig};
pub use crate::core::{
    FileRecord, MatchType, ParallelSearch, PathIndex, SearchResult, Searcher, ShardSearcher,
    build_index, normalize_separators, search,
};
pub use error::{EngineError, Result};
pub use fs::{ContentSource, FsSource, MemorySource};
pub use utils::analysis::{
    BlastRadius, DependencyGraph, FileNode, GraphBuilder, ImpactAnalysis, ImpactAnalyzer,
    ImportEdge, MultiImpact, analyze_impact, analyze_multiple_impacts, build_dependency_graph,
    calculate_import_ranks, resolve_import_path,
};
