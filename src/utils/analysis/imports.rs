//! Import and export extraction
//!
//! Pattern-based, line-oriented scanning for the JS/TS family and Python.
//! Only single-line statements are recognised.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// One import statement found in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    /// Module specifier exactly as written
    pub specifier: String,
    /// Imported names; empty for whole-module, namespace and side-effect imports
    pub names: Vec<String>,
    /// Default or namespace binding
    pub is_default: bool,
    pub is_dynamic: bool,
    /// 1-based line number
    pub line: usize,
    /// In-set target path, filled during graph construction
    pub resolved: Option<String>,
}

impl ImportEdge {
    fn new(specifier: &str, line: usize) -> Self {
        Self {
            specifier: specifier.to_string(),
            names: Vec::new(),
            is_default: false,
            is_dynamic: false,
            line,
            resolved: None,
        }
    }

    fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    fn default_binding(mut self) -> Self {
        self.is_default = true;
        self
    }

    fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLanguage {
    Script,
    Python,
}

impl SourceLanguage {
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "tsx" | "js" | "jsx" | "mjs" | "cjs" | "mts" | "cts" => Some(Self::Script),
            "py" => Some(Self::Python),
            _ => None,
        }
    }

    fn is_comment(self, trimmed: &str) -> bool {
        match self {
            Self::Script => {
                trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
            }
            Self::Python => trimmed.starts_with('#'),
        }
    }
}

lazy_static! {
    static ref JS_SIDE_EFFECT: Regex =
        Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).unwrap();
    static ref JS_DEFAULT_AND_NAMED: Regex = Regex::new(
        r#"^\s*import\s+(?:type\s+)?([A-Za-z_$][\w$]*)\s*,\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref JS_NAMESPACE: Regex = Regex::new(
        r#"^\s*import\s+(?:type\s+)?(?:[A-Za-z_$][\w$]*\s*,\s*)?\*\s*as\s+[A-Za-z_$][\w$]*\s+from\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref JS_NAMED: Regex = Regex::new(
        r#"^\s*import\s+(?:type\s+)?\{([^}]*)\}\s*from\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref JS_DEFAULT: Regex = Regex::new(
        r#"^\s*import\s+(?:type\s+)?([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref JS_RE_EXPORT: Regex = Regex::new(
        r#"^\s*export\s+(?:type\s+)?(?:\*(?:\s+as\s+[A-Za-z_$][\w$]*)?|\{([^}]*)\})\s*from\s*['"]([^'"]+)['"]"#
    ).unwrap();
    static ref JS_DYNAMIC: Regex =
        Regex::new(r#"\bimport\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap();
    static ref JS_REQUIRE: Regex = Regex::new(
        r#"(?:\b(?:const|let|var)\s+(?:([A-Za-z_$][\w$]*)|\{([^}]*)\})\s*=\s*)?\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#
    ).unwrap();

    static ref PY_IMPORT: Regex = Regex::new(r"^\s*import\s+(.+)$").unwrap();
    static ref PY_FROM: Regex = Regex::new(r"^\s*from\s+(\S+)\s+import\s+(.+)$").unwrap();

    static ref JS_EXPORT_DECL: Regex = Regex::new(
        r"^\s*export\s+(?:declare\s+)?(?:abstract\s+)?(?:async\s+)?(?:function\s*\*?\s*|(?:const|let|var|class|interface|type|enum)\s+)([A-Za-z_$][\w$]*)"
    ).unwrap();
    static ref JS_EXPORT_LIST: Regex =
        Regex::new(r"^\s*export\s+(?:type\s+)?\{([^}]*)\}").unwrap();
    static ref JS_EXPORT_DEFAULT: Regex = Regex::new(r"^\s*export\s+default\b").unwrap();

    static ref PY_TOP_LEVEL_DEF: Regex =
        Regex::new(r"^(?:async\s+)?(?:def|class)\s+([A-Za-z_]\w*)").unwrap();
}

/// Splits `a, b as c, type d` into imported names (`a`, `b`, `d`).
fn parse_import_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let item = item.strip_prefix("type ").unwrap_or(item).trim();
            let name = item.split_whitespace().next()?;
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Splits `a, b as c` into exported names (`a`, `c`): the alias wins.
fn parse_export_list(list: &str) -> Vec<String> {
    list.split(',')
        .filter_map(|item| {
            let item = item.trim();
            let item = item.strip_prefix("type ").unwrap_or(item).trim();
            let name = match item.split_once(" as ") {
                Some((_, alias)) => alias.trim(),
                None => item,
            };
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

fn strip_trailing_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Extracts every recognised import statement, in source order.
pub fn extract_imports(path: &str, content: &str) -> Vec<ImportEdge> {
    let Some(language) = SourceLanguage::from_path(path) else {
        return Vec::new();
    };

    let mut imports = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        if language.is_comment(line.trim_start()) {
            continue;
        }
        match language {
            SourceLanguage::Script => scan_script_line(line, line_no, &mut imports),
            SourceLanguage::Python => scan_python_line(line, line_no, &mut imports),
        }
    }
    imports
}

fn scan_script_line(line: &str, line_no: usize, out: &mut Vec<ImportEdge>) {
    // At most one static form per line, tried most specific first.
    if let Some(caps) = JS_SIDE_EFFECT.captures(line) {
        out.push(ImportEdge::new(&caps[1], line_no));
    } else if let Some(caps) = JS_DEFAULT_AND_NAMED.captures(line) {
        let mut names = vec![caps[1].to_string()];
        names.extend(parse_import_list(&caps[2]));
        out.push(
            ImportEdge::new(&caps[3], line_no)
                .with_names(names)
                .default_binding(),
        );
    } else if let Some(caps) = JS_NAMESPACE.captures(line) {
        out.push(ImportEdge::new(&caps[1], line_no).default_binding());
    } else if let Some(caps) = JS_NAMED.captures(line) {
        out.push(ImportEdge::new(&caps[2], line_no).with_names(parse_import_list(&caps[1])));
    } else if let Some(caps) = JS_DEFAULT.captures(line) {
        out.push(
            ImportEdge::new(&caps[2], line_no)
                .with_names(vec![caps[1].to_string()])
                .default_binding(),
        );
    } else if let Some(caps) = JS_RE_EXPORT.captures(line) {
        let names = caps
            .get(1)
            .map(|m| parse_import_list(m.as_str()))
            .unwrap_or_default();
        out.push(ImportEdge::new(&caps[2], line_no).with_names(names));
    }

    for caps in JS_DYNAMIC.captures_iter(line) {
        out.push(ImportEdge::new(&caps[1], line_no).dynamic());
    }

    for caps in JS_REQUIRE.captures_iter(line) {
        let edge = ImportEdge::new(&caps[3], line_no);
        let edge = if let Some(binding) = caps.get(1) {
            edge.with_names(vec![binding.as_str().to_string()])
                .default_binding()
        } else if let Some(list) = caps.get(2) {
            edge.with_names(parse_import_list(&list.as_str().replace(':', " ")))
        } else {
            edge
        };
        out.push(edge);
    }
}

fn scan_python_line(line: &str, line_no: usize, out: &mut Vec<ImportEdge>) {
    let line = strip_trailing_comment(line);

    if let Some(caps) = PY_FROM.captures(line) {
        let list = caps[2].trim().trim_start_matches('(').trim_end_matches(')');
        let names = if list.trim() == "*" {
            Vec::new()
        } else {
            parse_import_list(list)
        };
        out.push(ImportEdge::new(&caps[1], line_no).with_names(names));
    } else if let Some(caps) = PY_IMPORT.captures(line) {
        for module in caps[1].split(',') {
            if let Some(name) = module.split_whitespace().next() {
                out.push(ImportEdge::new(name, line_no));
            }
        }
    }
}

/// Extracts exported names, deduplicated in first-seen order.
pub fn extract_exports(path: &str, content: &str) -> Vec<String> {
    let Some(language) = SourceLanguage::from_path(path) else {
        return Vec::new();
    };

    let mut exports: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !exports.contains(&name) {
            exports.push(name);
        }
    };

    for line in content.lines() {
        if language.is_comment(line.trim_start()) {
            continue;
        }
        match language {
            SourceLanguage::Script => {
                if JS_EXPORT_DEFAULT.is_match(line) {
                    push("default".to_string());
                } else if let Some(caps) = JS_EXPORT_DECL.captures(line) {
                    push(caps[1].to_string());
                } else if let Some(caps) = JS_EXPORT_LIST.captures(line) {
                    for name in parse_export_list(&caps[1]) {
                        push(name);
                    }
                }
            }
            SourceLanguage::Python => {
                if let Some(caps) = PY_TOP_LEVEL_DEF.captures(line) {
                    if !caps[1].starts_with('_') {
                        push(caps[1].to_string());
                    }
                }
            }
        }
    }
    exports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specifiers(edges: &[ImportEdge]) -> Vec<&str> {
        edges.iter().map(|e| e.specifier.as_str()).collect()
    }

    #[test]
    fn test_script_static_forms() {
        let content = r#"
import './polyfills';
import React, { useState, useEffect as effect } from 'react';
import * as path from "node:path";
import { Router, type Route } from './router';
import App from './App';
import type Config from '@/config';
"#;
        let edges = extract_imports("src/main.tsx", content);
        assert_eq!(
            specifiers(&edges),
            vec!["./polyfills", "react", "node:path", "./router", "./App", "@/config"]
        );

        assert!(edges[0].names.is_empty());
        assert!(!edges[0].is_default);

        assert_eq!(edges[1].names, vec!["React", "useState", "useEffect"]);
        assert!(edges[1].is_default);

        assert!(edges[2].names.is_empty());
        assert!(edges[2].is_default);

        assert_eq!(edges[3].names, vec!["Router", "Route"]);
        assert!(!edges[3].is_default);

        assert_eq!(edges[4].names, vec!["App"]);
        assert!(edges[4].is_default);
        assert_eq!(edges[4].line, 6);

        assert_eq!(edges[5].names, vec!["Config"]);
    }

    #[test]
    fn test_dynamic_and_require() {
        let content = r#"const lazy = () => import('./lazy');
const fs = require('fs');
const { join, resolve: r } = require("path");
require('./side-effect');"#;
        let edges = extract_imports("index.js", content);
        assert_eq!(
            specifiers(&edges),
            vec!["./lazy", "fs", "path", "./side-effect"]
        );
        assert!(edges[0].is_dynamic);
        assert_eq!(edges[1].names, vec!["fs"]);
        assert!(edges[1].is_default);
        assert_eq!(edges[2].names, vec!["join", "resolve"]);
        assert!(edges[3].names.is_empty());
        assert_eq!(edges[3].line, 4);
    }

    #[test]
    fn test_re_exports_are_imports() {
        let content = "export { a, b as c } from './lib';\nexport * from './all';";
        let edges = extract_imports("index.ts", content);
        assert_eq!(specifiers(&edges), vec!["./lib", "./all"]);
        assert_eq!(edges[0].names, vec!["a", "b"]);
        assert!(edges[1].names.is_empty());
    }

    #[test]
    fn test_commented_lines_are_skipped() {
        let content = "// import a from './a';\n/* import b from './b'; */\n * import c from './c';\nimport d from './d';";
        let edges = extract_imports("x.ts", content);
        assert_eq!(specifiers(&edges), vec!["./d"]);
    }

    #[test]
    fn test_python_forms() {
        let content = "import os, sys as system\nfrom .models import User, Group as G  # comment\nfrom ..core import *\n# import hidden\n";
        let edges = extract_imports("app/views.py", content);
        assert_eq!(specifiers(&edges), vec!["os", "sys", ".models", "..core"]);
        assert_eq!(edges[2].names, vec!["User", "Group"]);
        assert!(edges[3].names.is_empty());
        assert_eq!(edges[3].line, 3);
    }

    #[test]
    fn test_unknown_language_yields_nothing() {
        assert!(extract_imports("README.md", "import x from './x'").is_empty());
        assert!(extract_exports("main.rs", "export function f() {}").is_empty());
    }

    #[test]
    fn test_script_exports() {
        let content = r#"
export function handle() {}
export async function load() {}
export const LIMIT = 3;
export class Router {}
export interface Route {}
export type Id = string;
export enum Mode { A }
export { helper, internal as publicName };
export default Router;
export const LIMIT = 4;
"#;
        let exports = extract_exports("router.ts", content);
        assert_eq!(
            exports,
            vec![
                "handle",
                "load",
                "LIMIT",
                "Router",
                "Route",
                "Id",
                "Mode",
                "helper",
                "publicName",
                "default"
            ]
        );
    }

    #[test]
    fn test_python_exports() {
        let content = "def public():\n    def nested():\n        pass\n\ndef _private():\n    pass\n\nclass Model:\n    def method(self):\n        pass\nasync def fetch():\n    pass\n";
        assert_eq!(
            extract_exports("models.py", content),
            vec!["public", "Model", "fetch"]
        );
    }
}
