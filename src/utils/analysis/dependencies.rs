//! Dependency graph construction
//!
//! Reads every file through a [`ContentSource`], extracts imports and exports,
//! then resolves specifiers against the file set to link importers to targets.

use std::collections::HashSet;
use std::path::Path;

use rayon::prelude::*;

use super::graph::{DependencyGraph, FileNode, graph_key};
use super::imports::{extract_exports, extract_imports};
use crate::config::{AliasRule, GraphConfig};
use crate::fs::{ContentSource, FsSource};

/// Extensions appended to an extensionless specifier, in probe order.
pub const PROBE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".py", ".json",
];

/// Directory entry points, in probe order.
pub const INDEX_FILES: &[&str] = &["index.ts", "index.tsx", "index.js", "index.jsx", "__init__.py"];

/// Extensions removed from a specifier before probing.
const STRIPPABLE_EXTENSIONS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts", ".py", ".json",
];

/// Collapses `.` and `..` segments. Returns `None` when the path climbs above the root.
pub fn normalize_path(path: &str) -> Option<String> {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop()?;
            }
            _ => stack.push(part),
        }
    }
    Some(stack.join("/"))
}

/// True for specifiers that never name a file in the set: packages such as
/// `react`, `@scope/pkg` or `node:fs`, and absolute paths like `/usr/lib/x`.
pub fn is_external_specifier(specifier: &str, aliases: &[AliasRule]) -> bool {
    !specifier.starts_with('.') && !aliases.iter().any(|rule| specifier.starts_with(&rule.prefix))
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// `.mod` -> `./mod`, `..pkg.mod` -> `../pkg/mod`, `..` -> `../`
fn python_relative_to_path(specifier: &str) -> String {
    let dots = specifier.chars().take_while(|c| *c == '.').count();
    let rest = specifier[dots..].replace('.', "/");
    let prefix = if dots == 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };
    format!("{prefix}{rest}")
}

fn strip_source_extension(path: &str) -> &str {
    STRIPPABLE_EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
        .unwrap_or(path)
}

/// Resolves an import specifier to a path in `known_files`.
///
/// Bare package specifiers never resolve.
pub fn resolve_import_path(
    specifier: &str,
    importer: &str,
    known_files: &HashSet<String>,
    aliases: &[AliasRule],
) -> Option<String> {
    let specifier = specifier.trim();
    if specifier.is_empty() || is_external_specifier(specifier, aliases) {
        return None;
    }
    let importer = graph_key(importer);

    let joined = if let Some(rule) = aliases.iter().find(|r| specifier.starts_with(&r.prefix)) {
        format!("{}{}", rule.target, &specifier[rule.prefix.len()..])
    } else {
        let relative = if importer.ends_with(".py") && !specifier.contains('/') {
            python_relative_to_path(specifier)
        } else {
            specifier.to_string()
        };
        format!("{}/{}", parent_dir(&importer), relative)
    };

    let normalized = normalize_path(&joined)?;
    let stem = strip_source_extension(&normalized);

    if !stem.is_empty() {
        for ext in PROBE_EXTENSIONS {
            let candidate = format!("{stem}{ext}");
            if known_files.contains(&candidate) {
                return Some(candidate);
            }
        }
    }
    for index in INDEX_FILES {
        let candidate = if stem.is_empty() {
            index.to_string()
        } else {
            format!("{stem}/{index}")
        };
        if known_files.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Builds a [`DependencyGraph`] from a file list and a content source.
pub struct GraphBuilder<'a, C: ContentSource + ?Sized> {
    source: &'a C,
    config: GraphConfig,
}

impl<'a, C: ContentSource + ?Sized> GraphBuilder<'a, C> {
    pub fn new(source: &'a C) -> Self {
        Self::with_config(source, GraphConfig::default())
    }

    pub fn with_config(source: &'a C, config: GraphConfig) -> Self {
        Self { source, config }
    }

    fn parse_file(&self, path: &str) -> FileNode {
        let mut node = FileNode::new(path);
        match self.source.read(path) {
            Ok(content) => {
                node.imports = extract_imports(path, &content);
                node.exports = extract_exports(path, &content);
            }
            Err(e) => {
                tracing::debug!("Skipping unreadable file {}: {:#}", path, e);
            }
        }
        node
    }

    fn parse_batch(&self, pool: Option<&rayon::ThreadPool>, batch: &[String]) -> Vec<FileNode> {
        match pool {
            Some(pool) => pool.install(|| batch.par_iter().map(|p| self.parse_file(p)).collect()),
            // Fallback to sequential
            None => batch.iter().map(|p| self.parse_file(p)).collect(),
        }
    }

    pub fn build<S: AsRef<str>>(&self, files: &[S]) -> DependencyGraph {
        let mut seen = HashSet::new();
        let paths: Vec<String> = files
            .iter()
            .map(|f| graph_key(f.as_ref()))
            .filter(|p| seen.insert(p.clone()))
            .collect();
        let known: HashSet<String> = seen;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.read_concurrency.max(1))
            .build();
        if let Err(e) = &pool {
            tracing::warn!("Falling back to sequential reads: {}", e);
        }
        let pool = pool.ok();

        let mut nodes = Vec::with_capacity(paths.len());
        for batch in paths.chunks(self.config.batch_size.max(1)) {
            nodes.extend(self.parse_batch(pool.as_ref(), batch));
        }

        let mut graph = DependencyGraph::new();
        let mut links = Vec::new();
        for mut node in nodes {
            for edge in &mut node.imports {
                edge.resolved = resolve_import_path(
                    &edge.specifier,
                    &node.path,
                    &known,
                    &self.config.aliases,
                )
                .filter(|target| *target != node.path);
                if let Some(target) = &edge.resolved {
                    links.push((node.path.clone(), target.clone()));
                }
            }
            graph.add_node(node);
        }
        for (from, to) in &links {
            graph.link(from, to);
        }
        graph.sync_dependents();

        tracing::info!(
            files = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        graph
    }
}

/// Builds the graph for `files` (relative to `root`) with default settings.
pub fn build_dependency_graph<S: AsRef<str>>(files: &[S], root: &Path) -> DependencyGraph {
    let source = FsSource::new(root);
    GraphBuilder::new(&source).build(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemorySource;

    fn known(paths: &[&str]) -> HashSet<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    fn aliases() -> Vec<AliasRule> {
        GraphConfig::default().aliases
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src/a/../b/./c.ts").as_deref(), Some("src/b/c.ts"));
        assert_eq!(normalize_path("/src//x").as_deref(), Some("src/x"));
        assert_eq!(normalize_path("../outside"), None);
    }

    #[test]
    fn test_relative_resolution_probe_order() {
        let files = known(&[
            "src/a.ts",
            "src/b.tsx",
            "src/b.js",
            "src/lib/index.ts",
            "src/c/index.js",
        ]);
        let resolve = |spec: &str| resolve_import_path(spec, "src/a.ts", &files, &aliases());

        assert_eq!(resolve("./b").as_deref(), Some("src/b.tsx"));
        assert_eq!(resolve("./b.js").as_deref(), Some("src/b.tsx"));
        assert_eq!(resolve("./lib").as_deref(), Some("src/lib/index.ts"));
        assert_eq!(resolve("./c").as_deref(), Some("src/c/index.js"));
        assert_eq!(resolve("../src/b").as_deref(), Some("src/b.tsx"));
        assert_eq!(resolve("./missing"), None);
        assert_eq!(resolve("../../escape"), None);
    }

    #[test]
    fn test_alias_resolution() {
        let files = known(&["src/config.ts", "src/ui/button.tsx"]);
        assert_eq!(
            resolve_import_path("@/config", "app/page.ts", &files, &aliases()).as_deref(),
            Some("src/config.ts")
        );
        assert_eq!(
            resolve_import_path("~/ui/button", "app/page.ts", &files, &aliases()).as_deref(),
            Some("src/ui/button.tsx")
        );
        assert_eq!(resolve_import_path("@/config", "app/page.ts", &files, &[]), None);
    }

    #[test]
    fn test_bare_specifiers_never_resolve() {
        let files = known(&["react.ts", "lodash/index.js", "node_modules/react/index.js", "os.py"]);
        for spec in ["react", "lodash", "@scope/pkg", "node:fs", "os"] {
            assert!(is_external_specifier(spec, &aliases()));
            assert_eq!(resolve_import_path(spec, "main.ts", &files, &aliases()), None);
            assert_eq!(resolve_import_path(spec, "main.py", &files, &aliases()), None);
        }
        assert!(!is_external_specifier("./x", &aliases()));
        assert!(!is_external_specifier("@/x", &aliases()));
    }

    #[test]
    fn test_absolute_specifiers_are_external() {
        let files = known(&["src/a.ts", "src/b.ts", "b.ts"]);
        for spec in ["/src/b", "/b.ts", "/usr/lib/node/b"] {
            assert!(is_external_specifier(spec, &aliases()));
            assert_eq!(resolve_import_path(spec, "src/a.ts", &files, &aliases()), None);
        }
    }

    #[test]
    fn test_python_relative_specifiers() {
        let files = known(&[
            "app/models.py",
            "app/views.py",
            "core/__init__.py",
            "core/db/session.py",
        ]);
        let resolve = |spec: &str, from: &str| resolve_import_path(spec, from, &files, &aliases());

        assert_eq!(resolve(".models", "app/views.py").as_deref(), Some("app/models.py"));
        assert_eq!(resolve("..core", "app/views.py").as_deref(), Some("core/__init__.py"));
        assert_eq!(
            resolve("..core.db.session", "app/views.py").as_deref(),
            Some("core/db/session.py")
        );
        assert_eq!(resolve(".", "core/db/session.py"), None);
        assert_eq!(resolve("..", "core/db/session.py").as_deref(), Some("core/__init__.py"));
    }

    #[test]
    fn test_build_from_memory() {
        let source: MemorySource = [
            ("src/a.ts", "export const a = 1;\n"),
            ("src/b.ts", "import { a } from './a';\nexport function b() {}\n"),
            (
                "src/c.ts",
                "import { a } from './a';\nimport { b } from './b';\nimport x from 'react';\n",
            ),
            ("src/self.ts", "import { s } from './self';\n"),
        ]
        .into_iter()
        .collect();
        let files = source.paths();
        let graph = GraphBuilder::new(&source).build(&files);

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.dependents_of("src/a.ts"), vec!["src/b.ts", "src/c.ts"]);
        assert_eq!(graph.dependents_of("src/b.ts"), vec!["src/c.ts"]);
        assert!(graph.dependents_of("src/self.ts").is_empty());

        let c = graph.node("src/c.ts").map(|n| n.dependencies());
        assert_eq!(c, Some(vec!["src/a.ts", "src/b.ts"]));

        let b = graph.node("src/b.ts").map(|n| n.exports.clone());
        assert_eq!(b, Some(vec!["b".to_string()]));

        let a = graph.node("src/a.ts").map(|n| n.dependents.clone());
        assert_eq!(a, Some(vec!["src/b.ts".to_string(), "src/c.ts".to_string()]));
    }

    #[test]
    fn test_unreadable_files_become_empty_nodes() {
        let source: MemorySource = [("src/a.ts", "import './b';")].into_iter().collect();
        let graph = GraphBuilder::new(&source).build(&["src/a.ts", "src/b.ts"]);

        assert_eq!(graph.node_count(), 2);
        let b = graph.node("src/b.ts").cloned().unwrap_or_default();
        assert!(b.imports.is_empty());
        assert!(b.exports.is_empty());
        assert_eq!(b.dependents, vec!["src/a.ts"]);
    }

    #[test]
    fn test_batch_size_does_not_change_output() {
        let source: MemorySource = (0..20)
            .map(|i| {
                let content = if i == 0 {
                    String::new()
                } else {
                    format!("import x from './f{}';\n", i - 1)
                };
                (format!("f{i}.ts"), content)
            })
            .collect();
        let files = source.paths();

        let reference = GraphBuilder::new(&source).build(&files);
        for (batch_size, read_concurrency) in [(1, 1), (3, 2), (7, 4), (100, 16)] {
            let config = GraphConfig {
                batch_size,
                read_concurrency,
                ..GraphConfig::default()
            };
            let graph = GraphBuilder::with_config(&source, config).build(&files);
            for path in reference.paths() {
                assert_eq!(graph.node(path), reference.node(path), "{path}");
            }
        }
    }

    #[test]
    fn test_build_from_disk() -> anyhow::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let root = temp.path();
        std::fs::create_dir_all(root.join("pkg"))?;
        std::fs::write(root.join("pkg/__init__.py"), "")?;
        std::fs::write(root.join("pkg/util.py"), "def helper():\n    pass\n")?;
        std::fs::write(root.join("pkg/main.py"), "from .util import helper\n")?;

        let graph =
            build_dependency_graph(&["pkg/__init__.py", "pkg/util.py", "pkg/main.py"], root);
        assert_eq!(graph.dependents_of("pkg/util.py"), vec!["pkg/main.py"]);
        Ok(())
    }
}
