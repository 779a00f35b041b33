//! Path search core
//!
//! Index construction, structural scoring and the sharded search orchestrator.

pub mod index;
pub mod parallel;
pub mod scorer;
pub mod searcher;
mod types;

pub use index::{PathIndex, build_index, normalize_separators};
pub use parallel::{ParallelSearch, ShardSearcher};
pub use scorer::{PreparedQuery, score_entry, search};
pub use searcher::Searcher;
pub use types::*;
