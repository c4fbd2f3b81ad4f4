//! Measurement unit canonicalization.
//!
//! Maps unit aliases onto a closed set of canonical units and resolves a
//! portion amount to grams. Only used when a source portion omits an
//! explicit `gram_weight`.
//!
//! Milliliters are treated as grams one-for-one. There is no density table;
//! liquids denser or lighter than water are recorded at their volume.

use std::fmt;

use crate::error::{CatalogError, Result};

/// Canonical units understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalUnit {
    Gram,
    Milliliter,
}

impl CanonicalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalUnit::Gram => "g",
            CanonicalUnit::Milliliter => "ml",
        }
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonicalize a unit string (case-insensitive, surrounding whitespace ignored).
pub fn normalize_unit(unit: &str) -> Result<CanonicalUnit> {
    match unit.trim().to_lowercase().as_str() {
        "g" | "gram" | "grams" => Ok(CanonicalUnit::Gram),
        "ml" | "milliliter" | "milliliters" => Ok(CanonicalUnit::Milliliter),
        _ => Err(CatalogError::UnsupportedUnit {
            unit: unit.to_string(),
        }),
    }
}

/// Gram-equivalent weight of `amount` in `unit`.
pub fn to_grams(amount: f64, unit: &str) -> Result<f64> {
    match normalize_unit(unit)? {
        CanonicalUnit::Gram => Ok(amount),
        // 1 ml == 1 g
        CanonicalUnit::Milliliter => Ok(amount),
    }
}
