use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Name of the optional configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "blastscope.toml";

/// Rewrites an import alias prefix (e.g. `@/`) into a root-relative path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub prefix: String,
    pub target: String,
}

impl AliasRule {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

/// Settings for the structural search path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// File count at which the searcher switches to sharded parallel search
    pub parallel_threshold: usize,
    /// Fixed shard count; `None` derives it from available parallelism
    pub shard_count: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 5000,
            shard_count: None,
        }
    }
}

/// Settings for dependency graph construction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum number of file reads in flight at once
    pub read_concurrency: usize,
    /// Number of files handed to the read pool per batch
    pub batch_size: usize,
    /// Import alias prefixes, tried in order
    pub aliases: Vec<AliasRule>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            read_concurrency: 16,
            batch_size: 256,
            aliases: vec![AliasRule::new("@/", "src/"), AliasRule::new("~/", "src/")],
        }
    }
}

/// Main configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub search: SearchConfig,
    pub graph: GraphConfig,
}

impl EngineConfig {
    /// Rejects settings that would stall the graph builder or spawn no shards.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.graph.read_concurrency == 0 {
            anyhow::bail!("graph.read_concurrency must be at least 1");
        }
        if self.graph.batch_size == 0 {
            anyhow::bail!("graph.batch_size must be at least 1");
        }
        if self.search.shard_count == Some(0) {
            anyhow::bail!("search.shard_count must be at least 1 when set");
        }
        if let Some(rule) = self.graph.aliases.iter().find(|r| r.prefix.is_empty()) {
            anyhow::bail!("alias prefix for target {:?} is empty", rule.target);
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
    }

    /// Attempts to load `blastscope.toml` from the current directory.
    pub fn load_from_file() -> Option<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if !path.exists() {
            return None;
        }
        match Self::load(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Ignoring {}: {:#}", CONFIG_FILE_NAME, e);
                None
            }
        }
    }
}
