//! Source document loading.
//!
//! A source document is a JSON object carrying provider metadata under
//! `source` and a list of item payloads under `items`. Loading only checks
//! that structure; field coercion and defaults are applied by
//! [`crate::merge`].

use anyhow::Result as AnyResult;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ImportConfig;
use crate::error::{CatalogError, Result};

/// A parsed source file: provider metadata plus the raw item payloads.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// The `source` object, or `null` when the file has none.
    pub source: Value,
    pub items: Vec<Value>,
}

impl SourceDocument {
    pub fn items(&self) -> &[Value] {
        &self.items
    }

    fn source_field(&self, field: &str) -> Option<&str> {
        self.source.get(field).and_then(Value::as_str)
    }
}

pub fn load_source(path: &Path) -> Result<SourceDocument> {
    let load_err = |reason: &str| CatalogError::SourceLoad {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| load_err(&format!("unable to read: {}", e)))?;
    let payload: Value =
        serde_json::from_str(&content).map_err(|e| load_err(&format!("invalid JSON: {}", e)))?;

    let Value::Object(mut obj) = payload else {
        return Err(load_err("top level is not an object"));
    };
    let items = match obj.remove("items") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(load_err("items is not an array")),
        None => return Err(load_err("missing items")),
    };

    Ok(SourceDocument {
        path: path.to_path_buf(),
        source: obj.remove("source").unwrap_or(Value::Null),
        items,
    })
}

/// Load every path in order. The first failure aborts the batch.
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceDocument>> {
    paths.iter().map(|p| load_source(p)).collect()
}

/// Expand directories into the matching source files beneath them.
///
/// Plain file paths pass through untouched; directory contents are sorted
/// by relative path so merge order is reproducible.
pub fn resolve_source_paths(paths: &[PathBuf], import: &ImportConfig) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();
    for path in paths {
        if path.is_dir() {
            let files = scan_directory(path, import)?;
            if files.is_empty() {
                return Err(CatalogError::SourceLoad {
                    path: path.clone(),
                    reason: "directory contains no matching source files".to_string(),
                });
            }
            resolved.extend(files);
        } else {
            resolved.push(path.clone());
        }
    }
    Ok(resolved)
}

fn scan_directory(root: &Path, import: &ImportConfig) -> Result<Vec<PathBuf>> {
    let dir_err = |reason: String| CatalogError::SourceLoad {
        path: root.to_path_buf(),
        reason,
    };

    let include_set = build_globset(&import.include_globs).map_err(|e| dir_err(e.to_string()))?;
    let exclude_set = build_globset(&import.exclude_globs).map_err(|e| dir_err(e.to_string()))?;

    let mut files: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| dir_err(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        files.push((rel_str, path.to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files.into_iter().map(|(_, p)| p).collect())
}

fn build_globset(patterns: &[String]) -> AnyResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// `catalog sources`: load each source and print a summary table.
pub fn list_sources(paths: &[PathBuf], import: &ImportConfig) -> Result<()> {
    let resolved = resolve_source_paths(paths, import)?;
    let docs = load_sources(&resolved)?;

    println!(
        "{:<20} {:<24} {:<10} {:>6}  PATH",
        "SOURCE", "DATASET", "VERSION", "ITEMS"
    );
    for doc in &docs {
        println!(
            "{:<20} {:<24} {:<10} {:>6}  {}",
            doc.source_field("name").unwrap_or("-"),
            doc.source_field("dataset").unwrap_or("-"),
            doc.source_field("version").unwrap_or("-"),
            doc.items().len(),
            doc.path.display()
        );
    }

    Ok(())
}
