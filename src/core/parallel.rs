//! Sharded parallel search
//!
//! The file list is split into contiguous chunks, one per worker thread. Each
//! worker builds and owns its own index, so the only traffic between threads
//! is a query going out and a ranked shard-local list coming back.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::index::PathIndex;
use crate::core::types::{SearchResult, sort_and_truncate};
use crate::error::{EngineError, Result};

/// A per-shard search backend.
///
/// Backends are constructed on their worker thread and never leave it.
pub trait ShardSearcher {
    fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchResult>>;
}

impl ShardSearcher for PathIndex {
    fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchResult>> {
        Ok(PathIndex::search(self, query, limit))
    }
}

enum ShardRequest {
    Search {
        query: Arc<str>,
        limit: usize,
        reply: Sender<ShardReply>,
    },
}

struct ShardReply {
    shard: usize,
    outcome: std::result::Result<Vec<SearchResult>, String>,
}

struct ShardHandle {
    id: usize,
    requests: Sender<ShardRequest>,
    thread: JoinHandle<()>,
}

/// Default shard count: one less than the available cores, never below two.
pub fn default_shard_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2)
        .saturating_sub(1)
        .max(2)
}

/// Fans a query out to worker threads and merges their answers.
pub struct ParallelSearch {
    shards: Vec<ShardHandle>,
    terminated: bool,
}

impl ParallelSearch {
    pub fn new<S: AsRef<str>>(files: &[S]) -> Result<Self> {
        Self::with_shards(files, default_shard_count())
    }

    pub fn with_shards<S: AsRef<str>>(files: &[S], shard_count: usize) -> Result<Self> {
        Self::with_builder(files, shard_count, |chunk: Vec<String>| {
            PathIndex::build(&chunk)
        })
    }

    /// Spawns one worker per non-empty chunk, each running `build` on its own
    /// chunk, and blocks until every worker reports ready.
    pub fn with_builder<S, B, F>(files: &[S], shard_count: usize, build: F) -> Result<Self>
    where
        S: AsRef<str>,
        B: ShardSearcher + 'static,
        F: Fn(Vec<String>) -> B + Send + Sync + 'static,
    {
        if shard_count == 0 {
            return Err(EngineError::InvalidShardCount);
        }

        let mut search = Self {
            shards: Vec::new(),
            terminated: false,
        };
        if files.is_empty() {
            return Ok(search);
        }

        let chunk_size = files.len().div_ceil(shard_count);
        let build = Arc::new(build);
        let (ready_tx, ready_rx) = unbounded::<(usize, std::result::Result<(), String>)>();

        for (id, chunk) in files.chunks(chunk_size).enumerate() {
            let chunk: Vec<String> = chunk.iter().map(|p| p.as_ref().to_string()).collect();
            let (request_tx, request_rx) = unbounded();
            let build = Arc::clone(&build);
            let ready_tx = ready_tx.clone();

            tracing::debug!(shard = id, files = chunk.len(), "spawning shard worker");
            let thread = thread::Builder::new()
                .name(format!("blastscope-shard-{id}"))
                .spawn(move || run_shard(id, chunk, &*build, ready_tx, request_rx))?;

            search.shards.push(ShardHandle {
                id,
                requests: request_tx,
                thread,
            });
        }
        drop(ready_tx);

        let mut ready = vec![false; search.shards.len()];
        for _ in 0..search.shards.len() {
            match ready_rx.recv() {
                Ok((shard, Ok(()))) => ready[shard] = true,
                Ok((shard, Err(message))) => {
                    return Err(EngineError::ShardFailed { shard, message });
                }
                Err(_) => {
                    let shard = ready.iter().position(|r| !r).unwrap_or_default();
                    return Err(EngineError::ShardDisconnected(shard));
                }
            }
        }

        tracing::info!(
            shards = search.shards.len(),
            files = files.len(),
            "parallel search ready"
        );
        Ok(search)
    }

    /// Number of live workers.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Broadcasts the query, waits for every shard and merges the results.
    ///
    /// The first shard error or disconnect fails the whole call.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        if self.terminated {
            return Err(EngineError::Terminated);
        }
        if limit == 0 || self.shards.is_empty() {
            return Ok(Vec::new());
        }

        let query: Arc<str> = Arc::from(query);
        let (reply_tx, reply_rx) = unbounded();
        for shard in &self.shards {
            shard
                .requests
                .send(ShardRequest::Search {
                    query: Arc::clone(&query),
                    limit,
                    reply: reply_tx.clone(),
                })
                .map_err(|_| EngineError::ShardDisconnected(shard.id))?;
        }
        drop(reply_tx);

        let mut replied = vec![false; self.shards.len()];
        let mut merged = Vec::new();
        for _ in 0..self.shards.len() {
            let reply = reply_rx.recv().map_err(|_| {
                let missing = replied.iter().position(|r| !r).unwrap_or_default();
                EngineError::ShardDisconnected(self.shards[missing].id)
            })?;
            if let Some(slot) = replied.get_mut(reply.shard) {
                *slot = true;
            }
            match reply.outcome {
                Ok(results) => merged.extend(results),
                Err(message) => {
                    return Err(EngineError::ShardFailed {
                        shard: reply.shard,
                        message,
                    });
                }
            }
        }

        sort_and_truncate(&mut merged, limit);
        Ok(merged)
    }

    /// Closes every request channel and joins the workers.
    pub fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        let count = self.shards.len();
        for shard in self.shards.drain(..) {
            drop(shard.requests);
            if shard.thread.join().is_err() {
                tracing::warn!(shard = shard.id, "shard worker exited abnormally");
            }
        }
        tracing::debug!(shards = count, "parallel search terminated");
    }
}

impl Drop for ParallelSearch {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn run_shard<B, F>(
    id: usize,
    chunk: Vec<String>,
    build: &F,
    ready: Sender<(usize, std::result::Result<(), String>)>,
    requests: Receiver<ShardRequest>,
) where
    B: ShardSearcher,
    F: Fn(Vec<String>) -> B,
{
    let searcher = match panic::catch_unwind(AssertUnwindSafe(|| build(chunk))) {
        Ok(searcher) => {
            let _ = ready.send((id, Ok(())));
            searcher
        }
        Err(payload) => {
            let _ = ready.send((id, Err(panic_message(payload.as_ref()))));
            return;
        }
    };
    drop(ready);

    for request in requests {
        match request {
            ShardRequest::Search {
                query,
                limit,
                reply,
            } => {
                let outcome =
                    match panic::catch_unwind(AssertUnwindSafe(|| searcher.search(&query, limit)))
                    {
                        Ok(Ok(results)) => Ok(results),
                        Ok(Err(e)) => Err(format!("{e:#}")),
                        Err(payload) => Err(panic_message(payload.as_ref())),
                    };
                let _ = reply.send(ShardReply { shard: id, outcome });
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_paths() -> Vec<String> {
        let mut paths = Vec::new();
        for module in ["auth", "billing", "search", "net", "ui"] {
            for file in ["service", "model", "handler", "router", "utils"] {
                paths.push(format!("src/{module}/{module}_{file}.ts"));
                paths.push(format!("src/{module}/{file}.test.ts"));
            }
        }
        paths.push("README.md".to_string());
        paths.push("src/router.ts".to_string());
        paths
    }

    #[test]
    fn test_matches_single_index_for_any_shard_count() -> anyhow::Result<()> {
        let paths = sample_paths();
        let single = PathIndex::build(&paths);
        let queries = ["router", "auth service", "billing model ts", "src/net", "utils.ts", "xyz"];

        for shards in 1..=5 {
            let parallel = ParallelSearch::with_shards(&paths, shards)?;
            for query in queries {
                for limit in [1, 3, 10, 100] {
                    assert_eq!(
                        parallel.search(query, limit)?,
                        single.search(query, limit),
                        "shards={shards} query={query:?} limit={limit}"
                    );
                }
            }
        }
        Ok(())
    }

    #[test]
    fn test_empty_file_list_spawns_nothing() -> anyhow::Result<()> {
        let files: Vec<String> = Vec::new();
        let parallel = ParallelSearch::with_shards(&files, 4)?;
        assert_eq!(parallel.shard_count(), 0);
        assert!(parallel.search("router", 10)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_empty_chunks_spawn_no_worker() -> anyhow::Result<()> {
        let files = ["a.ts", "b.ts", "c.ts", "d.ts"];
        // ceil(4 / 3) = 2, so only two chunks hold files
        let parallel = ParallelSearch::with_shards(&files, 3)?;
        assert_eq!(parallel.shard_count(), 2);

        let parallel = ParallelSearch::with_shards(&files, 8)?;
        assert_eq!(parallel.shard_count(), 4);
        Ok(())
    }

    #[test]
    fn test_zero_shards_rejected() {
        let result = ParallelSearch::with_shards(&["a.ts"], 0);
        assert!(matches!(result, Err(EngineError::InvalidShardCount)));
    }

    #[test]
    fn test_default_shard_count() {
        assert!(default_shard_count() >= 2);
    }

    struct FailingShard;

    impl ShardSearcher for FailingShard {
        fn search(&self, _query: &str, _limit: usize) -> anyhow::Result<Vec<SearchResult>> {
            anyhow::bail!("index unavailable")
        }
    }

    #[test]
    fn test_shard_error_fails_call() -> anyhow::Result<()> {
        let parallel = ParallelSearch::with_builder(&["a.ts", "b.ts"], 2, |_| FailingShard)?;
        match parallel.search("a", 10) {
            Err(EngineError::ShardFailed { message, .. }) => {
                assert!(message.contains("index unavailable"));
            }
            other => panic!("expected shard failure, got {:?}", other.map(|r| r.len())),
        }
        Ok(())
    }

    enum MixedShard {
        Healthy(PathIndex),
        Broken,
    }

    impl ShardSearcher for MixedShard {
        fn search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<SearchResult>> {
            match self {
                MixedShard::Healthy(index) => Ok(index.search(query, limit)),
                MixedShard::Broken => anyhow::bail!("index unavailable"),
            }
        }
    }

    #[test]
    fn test_single_failing_shard_fails_call() -> anyhow::Result<()> {
        let files = ["a.ts", "b.ts", "c.ts", "d.ts"];
        let parallel = ParallelSearch::with_builder(&files, 4, |chunk: Vec<String>| {
            if chunk.iter().any(|p| p == "c.ts") {
                MixedShard::Broken
            } else {
                MixedShard::Healthy(PathIndex::build(&chunk))
            }
        })?;
        assert_eq!(parallel.shard_count(), 4);

        for _ in 0..3 {
            match parallel.search("a", 10) {
                Err(EngineError::ShardFailed { shard, message }) => {
                    assert_eq!(shard, 2);
                    assert!(message.contains("index unavailable"));
                }
                other => panic!("expected shard failure, got {:?}", other.map(|r| r.len())),
            }
        }
        Ok(())
    }

    struct PanickingShard;

    impl ShardSearcher for PanickingShard {
        fn search(&self, _query: &str, _limit: usize) -> anyhow::Result<Vec<SearchResult>> {
            panic!("corrupt shard")
        }
    }

    #[test]
    fn test_shard_panic_is_reported() -> anyhow::Result<()> {
        let parallel = ParallelSearch::with_builder(&["a.ts"], 1, |_| PanickingShard)?;
        let err = parallel.search("a", 10).err();
        assert!(matches!(err, Some(EngineError::ShardFailed { shard: 0, .. })));

        // Worker survives and keeps answering.
        assert!(parallel.search("a", 10).is_err());
        Ok(())
    }

    #[test]
    fn test_build_panic_fails_construction() {
        let result = ParallelSearch::with_builder(&["a.ts"], 1, |_| -> PathIndex {
            panic!("cannot build")
        });
        assert!(matches!(result, Err(EngineError::ShardFailed { .. })));
    }

    #[test]
    fn test_terminate_rejects_later_calls() -> anyhow::Result<()> {
        let mut parallel = ParallelSearch::with_shards(&sample_paths(), 3)?;
        assert!(!parallel.search("router", 5)?.is_empty());

        parallel.terminate();
        assert!(parallel.is_terminated());
        assert_eq!(parallel.shard_count(), 0);
        assert!(matches!(
            parallel.search("router", 5),
            Err(EngineError::Terminated)
        ));

        // Idempotent
        parallel.terminate();
        Ok(())
    }
}
