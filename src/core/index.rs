//! Path index construction
//!
//! Turns raw repository paths into [`FileRecord`]s once, so that every query
//! only has to derive strings from the query itself.

use crate::core::types::FileRecord;

/// Collapses CamelCase boundaries and `-`/`_`/whitespace runs into single spaces,
/// then lowercases.
///
/// `normalize_separators("ScriptController") == normalize_separators("script_controller")`.
/// The function is idempotent.
pub fn normalize_separators(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev: Option<char> = None;
    let mut pending_space = false;

    for c in text.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            pending_space = true;
            prev = Some(c);
            continue;
        }

        let camel_boundary = c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase());
        if (pending_space || camel_boundary) && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        out.extend(c.to_lowercase());
        prev = Some(c);
    }

    out
}

/// Splits a path on both `/` and `\`, dropping empty segments.
pub fn split_components(path: &str) -> Vec<&str> {
    path.split(['/', '\\']).filter(|s| !s.is_empty()).collect()
}

/// Lowercase extension with its leading dot, or empty for dotfiles and bare names.
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < file_name.len() => file_name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

/// Drops whitespace and path separators so adjacent words compare as one run.
pub fn compact_form(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace() && *c != '/' && *c != '\\')
        .collect()
}

/// Builds the structural record for one path.
pub fn build_record(path: &str) -> FileRecord {
    let components = split_components(path);
    let file_name = components.last().copied().unwrap_or_default();
    let parent = if components.len() >= 2 {
        components[components.len() - 2]
    } else {
        ""
    };

    let unified = components.join("/");
    let normalized = normalize_separators(&unified);
    let compact = compact_form(&normalized);
    let file_name_lower = file_name.to_lowercase();
    let extension = extension_of(&file_name_lower);

    FileRecord {
        path: path.to_string(),
        lower: path.to_lowercase(),
        normalized,
        file_name: file_name.to_string(),
        file_name_normalized: normalize_separators(file_name),
        file_name_lower,
        parent: parent.to_string(),
        parent_lower: parent.to_lowercase(),
        parent_normalized: normalize_separators(parent),
        components: components.iter().map(|c| c.to_lowercase()).collect(),
        components_normalized: components.iter().map(|c| normalize_separators(c)).collect(),
        compact,
        extension,
        depth: components.len(),
    }
}

/// Immutable index over a fixed file set
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    records: Vec<FileRecord>,
}

impl PathIndex {
    pub fn build<S: AsRef<str>>(paths: &[S]) -> Self {
        let records = paths.iter().map(|p| build_record(p.as_ref())).collect();
        Self { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Free-function form of [`PathIndex::build`].
pub fn build_index<S: AsRef<str>>(paths: &[S]) -> PathIndex {
    PathIndex::build(paths)
}
