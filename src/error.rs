//! Error types for the search and graph engine.

/// Failures surfaced by the engine.
///
/// Most of the engine is infallible by contract (unreadable files become empty
/// nodes, unresolved imports are simply unlinked), so the variants here are
/// almost entirely about shard worker lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("shard {shard} failed: {message}")]
    ShardFailed { shard: usize, message: String },

    #[error("shard {0} disconnected before replying")]
    ShardDisconnected(usize),

    #[error("search orchestrator has been terminated")]
    Terminated,

    #[error("failed to spawn shard worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("shard count must be at least 1")]
    InvalidShardCount,
}

pub type Result<T> = std::result::Result<T, EngineError>;
