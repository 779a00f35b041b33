use crate::config::SearchConfig;
use crate::core::index::PathIndex;
use crate::core::parallel::{ParallelSearch, default_shard_count};
use crate::core::types::SearchResult;
use crate::error::Result;

/// Picks in-thread or sharded search based on the size of the file set.
pub enum Searcher {
    Single(PathIndex),
    Parallel(ParallelSearch),
}

impl Searcher {
    pub fn new<S: AsRef<str>>(paths: &[S], config: &SearchConfig) -> Result<Self> {
        if paths.len() < config.parallel_threshold {
            tracing::debug!(files = paths.len(), "using single-threaded search");
            return Ok(Searcher::Single(PathIndex::build(paths)));
        }

        let shards = config.shard_count.unwrap_or_else(default_shard_count);
        tracing::debug!(files = paths.len(), shards, "using sharded search");
        let parallel = ParallelSearch::with_shards(paths, shards)?;
        Ok(Searcher::Parallel(parallel))
    }

    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        match self {
            Searcher::Single(index) => Ok(index.search(query, limit)),
            Searcher::Parallel(parallel) => parallel.search(query, limit),
        }
    }

    pub fn is_parallel(&self) -> bool {
        matches!(self, Searcher::Parallel(_))
    }
}
