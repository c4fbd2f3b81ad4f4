//! Error types for the catalog pipeline.
//!
//! Every failure the pipeline can raise is a [`CatalogError`] variant, so
//! callers can tell a bad source file from a blocked validation gate without
//! parsing messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::validate::{Severity, ValidationIssue};

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Source file unreadable, not JSON, or missing `items`.
    #[error("failed to load source {}: {reason}", .path.display())]
    SourceLoad { path: PathBuf, reason: String },

    /// An item payload inside a loaded source is structurally unusable.
    #[error("invalid item payload in {}: {message}", .path.display())]
    InvalidPayload { path: PathBuf, message: String },

    #[error("unsupported unit: {unit}")]
    UnsupportedUnit { unit: String },

    /// The prior catalog exists but cannot be read back.
    #[error("failed to load catalog {}: {reason}", .path.display())]
    CatalogLoad { path: PathBuf, reason: String },

    #[error("failed to write catalog {}: {source}", .path.display())]
    CatalogWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// At least one issue has severity `error`. Carries warnings too.
    #[error(
        "validation failed: {} error(s), {} warning(s)",
        count_severity(.issues, Severity::Error),
        count_severity(.issues, Severity::Warning)
    )]
    Validation { issues: Vec<ValidationIssue> },
}

fn count_severity(issues: &[ValidationIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

impl CatalogError {
    /// Short label used in CLI and JSON progress output.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogError::SourceLoad { .. } | CatalogError::InvalidPayload { .. } => "load",
            CatalogError::UnsupportedUnit { .. } => "unit",
            CatalogError::Validation { .. } => "validation",
            CatalogError::CatalogLoad { .. } | CatalogError::CatalogWrite { .. } => "catalog",
        }
    }

    /// Process exit code for the `catalog` binary.
    pub fn exit_code(&self) -> u8 {
        match self.kind() {
            "load" => 2,
            "unit" => 3,
            "validation" => 4,
            _ => 5,
        }
    }

    /// Validation issues, if this is a validation failure.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            CatalogError::Validation { issues } => issues,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
