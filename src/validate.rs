//! Nutrient sanity checks.
//!
//! Every published item must carry calories and the three macros. Missing
//! or negative macros and missing calories are blocking errors; an
//! implausibly high calorie count is only a warning.

use serde::Serialize;
use std::fmt;

use crate::error::{CatalogError, Result};
use crate::models::FoodItem;

/// Default calorie ceiling per 100 g before an item is flagged as an outlier.
pub const MAX_CALORIES_PER_100G: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub item_id: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    pub fn error(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: item_id.to_string(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(item_id: &str, message: impl Into<String>) -> Self {
        Self {
            item_id: item_id.to_string(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.item_id, self.message)
    }
}

/// Issues for a single item.
pub fn validate_item(item: &FoodItem, max_calories: f64) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let nutrients = &item.nutrients_per_100g;

    for (macro_name, value) in [
        ("protein_g", nutrients.protein_g),
        ("fat_g", nutrients.fat_g),
        ("carbs_g", nutrients.carbs_g),
    ] {
        match value {
            None => issues.push(ValidationIssue::error(
                &item.id,
                format!("Missing macro nutrient: {}", macro_name),
            )),
            Some(v) if v < 0.0 => issues.push(ValidationIssue::error(
                &item.id,
                format!("Negative macro nutrient: {}", macro_name),
            )),
            Some(_) => {}
        }
    }

    match nutrients.calories_kcal {
        None => issues.push(ValidationIssue::error(&item.id, "Missing calories")),
        Some(kcal) if kcal > max_calories => issues.push(ValidationIssue::warning(
            &item.id,
            format!("Calories outlier (> {} per 100g)", max_calories),
        )),
        Some(_) => {}
    }

    issues
}

/// Validate every item. Returns all issues when none is an error; otherwise
/// fails with the full list, warnings included.
pub fn validate_catalog(items: &[FoodItem], max_calories: f64) -> Result<Vec<ValidationIssue>> {
    let issues: Vec<ValidationIssue> = items
        .iter()
        .flat_map(|item| validate_item(item, max_calories))
        .collect();

    if issues.iter().any(ValidationIssue::is_error) {
        return Err(CatalogError::Validation { issues });
    }
    Ok(issues)
}
