//! Import pipeline orchestration.
//!
//! Coordinates the full import flow: load sources → merge → version against
//! the prior catalog → validate → write. Everything before the write is
//! computed in memory; a failure at any stage returns before the catalog
//! file is touched.

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::config::Config;
use crate::error::Result;
use crate::merge::{merge, MergeDefaults};
use crate::models::{FoodItem, IdentityKey};
use crate::progress::{ImportProgressEvent, ImportProgressReporter};
use crate::sources::{load_source, resolve_source_paths};
use crate::validate::{validate_catalog, ValidationIssue};
use crate::versioning::{compute_version, ChangeStatus};

/// Result of a successful ingestion, before anything is written.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    /// Versioned items ordered by identity key.
    pub items: Vec<FoodItem>,
    /// Change status per identity key.
    pub changes: BTreeMap<IdentityKey, ChangeStatus>,
    /// Non-fatal validation issues.
    pub warnings: Vec<ValidationIssue>,
}

impl IngestOutcome {
    pub fn count(&self, status: ChangeStatus) -> usize {
        self.changes.values().filter(|s| **s == status).count()
    }
}

/// Load, merge, version and validate. The prior catalog is read from
/// `existing_path` (missing means empty) but never modified.
pub fn ingest_sources(
    source_paths: &[PathBuf],
    existing_path: &Path,
    config: &Config,
    progress: &dyn ImportProgressReporter,
) -> Result<IngestOutcome> {
    let resolved = resolve_source_paths(source_paths, &config.import)?;
    let mut documents = Vec::with_capacity(resolved.len());
    for path in &resolved {
        progress.report(ImportProgressEvent::Loading {
            path: path.display().to_string(),
        });
        documents.push(load_source(path)?);
    }

    let prior = catalog::load(existing_path)?;
    let merged = merge(&documents, &MergeDefaults::from(&config.import))?;
    progress.report(ImportProgressEvent::Merged {
        sources: documents.len() as u64,
        items: merged.len() as u64,
    });

    let now = Utc::now();
    let mut items = Vec::with_capacity(merged.len());
    let mut changes = BTreeMap::new();
    for (key, record) in merged {
        let versioned = compute_version(&key, &record, &prior, now);
        changes.insert(key, versioned.status);
        items.push(FoodItem {
            id: versioned.id,
            name: record.name,
            brand: record.brand,
            locale: record.locale,
            confidence: record.confidence,
            sources: record.sources.into_values().collect(),
            portions: record.portions,
            nutrients_per_100g: record.nutrients,
            version: versioned.version,
        });
    }

    let count = |status: ChangeStatus| changes.values().filter(|s| **s == status).count() as u64;
    progress.report(ImportProgressEvent::Versioned {
        new: count(ChangeStatus::New),
        changed: count(ChangeStatus::Changed),
        unchanged: count(ChangeStatus::Unchanged),
    });

    let validated = validate_catalog(&items, config.validation.max_calories_per_100g);
    let (errors, warnings) = match &validated {
        Ok(issues) => (0, issues.len()),
        Err(e) => {
            let errors = e.issues().iter().filter(|i| i.is_error()).count();
            (errors, e.issues().len() - errors)
        }
    };
    progress.report(ImportProgressEvent::Validated {
        errors: errors as u64,
        warnings: warnings as u64,
    });
    let warnings = validated?;

    Ok(IngestOutcome {
        items,
        changes,
        warnings,
    })
}

/// Outcome of `catalog import`.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub output: PathBuf,
    pub dry_run: bool,
    pub outcome: IngestOutcome,
}

impl ImportReport {
    pub fn item_count(&self) -> usize {
        self.outcome.items.len()
    }
}

/// Ingest `source_paths` against the catalog at `output` and replace it.
/// With `dry_run` the catalog is left as it was.
pub fn run_import(
    source_paths: &[PathBuf],
    output: &Path,
    config: &Config,
    dry_run: bool,
    progress: &dyn ImportProgressReporter,
) -> Result<ImportReport> {
    let outcome = ingest_sources(source_paths, output, config, progress)?;

    if !dry_run {
        catalog::write(&outcome.items, output)?;
    }
    progress.report(ImportProgressEvent::Finished {
        path: output.display().to_string(),
        items: outcome.items.len() as u64,
        dry_run,
    });

    Ok(ImportReport {
        output: output.to_path_buf(),
        dry_run,
        outcome,
    })
}
