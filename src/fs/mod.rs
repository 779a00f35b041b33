use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Supplies file contents to the graph builder by repository-relative path.
pub trait ContentSource: Sync {
    fn read(&self, path: &str) -> Result<String>;
}

/// Reads files from disk below `root`.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsSource {
    fn read(&self, path: &str) -> Result<String> {
        let full = self.root.join(path);
        let bytes = std::fs::read(&full).with_context(|| format!("Failed to read {:?}", full))?;
        String::from_utf8(bytes).with_context(|| format!("{:?} is not valid UTF-8", full))
    }
}

/// Serves contents from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl<P, C> FromIterator<(P, C)> for MemorySource
where
    P: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        let mut source = Self::new();
        for (path, content) in iter {
            source.insert(path, content);
        }
        source
    }
}

impl ContentSource for MemorySource {
    fn read(&self, path: &str) -> Result<String> {
        self.files
            .get(path)
            .cloned()
            .with_context(|| format!("No content for {}", path))
    }
}
