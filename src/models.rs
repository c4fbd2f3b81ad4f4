//! Core data models used throughout the catalog pipeline.
//!
//! These types represent the food items, portions, and nutrient profiles
//! that flow from source documents into the published catalog artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A contributing data provider, identified by `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub dataset: String,
    pub version: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A portion of a food item. `gram_weight` is always resolved to grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portion {
    pub description: String,
    pub amount: f64,
    pub unit: String,
    pub gram_weight: f64,
}

/// Nutrient values per 100 grams. `None` means unknown, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub calories_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub carbs_g: Option<f64>,
    #[serde(default)]
    pub fiber_g: Option<f64>,
    #[serde(default)]
    pub sugar_g: Option<f64>,
    #[serde(default)]
    pub sodium_mg: Option<f64>,
}

/// Revision metadata attached to every published item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub revision: u64,
    pub content_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// A published catalog entry.
///
/// `sources` is kept sorted by name with at most one entry per name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: String,
    pub name: String,
    pub brand: Option<String>,
    pub locale: String,
    pub confidence: f64,
    pub sources: Vec<SourceInfo>,
    pub portions: Vec<Portion>,
    pub nutrients_per_100g: NutrientProfile,
    pub version: VersionInfo,
}

impl FoodItem {
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey::new(&self.name, self.brand.as_deref(), &self.locale)
    }
}

/// Normalized `(name, brand, locale)` triple used as the merge key across runs.
///
/// Two payloads describe the same catalog entry iff their keys are equal;
/// the generated item `id` plays no part in identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdentityKey {
    name: String,
    brand: String,
    locale: String,
}

impl IdentityKey {
    pub fn new(name: &str, brand: Option<&str>, locale: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            brand: brand.unwrap_or("").trim().to_lowercase(),
            locale: locale.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}::{}", self.name, self.brand, self.locale)
    }
}
