//! Catalog artifact storage.
//!
//! The catalog is one JSON document `{"items": [...]}` that is rewritten
//! whole on every import. Items are ordered by identity key, sources by
//! name, and object keys are sorted, so unchanged items serialize to
//! identical bytes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};
use crate::models::{FoodItem, IdentityKey};

#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    items: Vec<FoodItem>,
}

/// Load a published catalog keyed by identity. A missing file is an empty catalog.
pub fn load(path: &Path) -> Result<BTreeMap<IdentityKey, FoodItem>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }

    let load_err = |reason: String| CatalogError::CatalogLoad {
        path: path.to_path_buf(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    let file: CatalogFile = serde_json::from_str(&content).map_err(|e| load_err(e.to_string()))?;

    Ok(file
        .items
        .into_iter()
        .map(|item| (item.identity_key(), item))
        .collect())
}

/// Serialize items in canonical order. Keys come out sorted because
/// `serde_json::Value` objects are ordered maps.
pub fn render(items: &[FoodItem]) -> serde_json::Result<String> {
    let mut ordered: Vec<FoodItem> = items.to_vec();
    for item in &mut ordered {
        item.sources.sort_by(|a, b| a.name.cmp(&b.name));
    }
    ordered.sort_by_key(FoodItem::identity_key);

    let value = serde_json::to_value(CatalogFile { items: ordered })?;
    let mut json = serde_json::to_string_pretty(&value)?;
    json.push('\n');
    Ok(json)
}

/// Write the full catalog, replacing any existing file in one rename.
pub fn write(items: &[FoodItem], path: &Path) -> Result<()> {
    let write_err = |source: std::io::Error| CatalogError::CatalogWrite {
        path: path.to_path_buf(),
        source,
    };

    let json = render(items)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "catalog.json".to_string());
    let tmp_path = parent.join(format!(".{}.tmp-{}", file_name, std::process::id()));

    let result = (|| {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    Ok(())
}
