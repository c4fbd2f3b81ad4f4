//! Multi-source merge.
//!
//! Folds item payloads from every source document into one [`MergedRecord`]
//! per [`IdentityKey`]. Field precedence:
//!
//! | Field | Rule |
//! |-------|------|
//! | `name`, `brand`, `locale` | first payload seen for the key |
//! | `confidence` | maximum over all payloads |
//! | `portions`, `nutrients` | payload with the highest confidence; ties go to the later payload |
//! | `sources` | union keyed by source name; a repeated name overwrites |
//!
//! Numeric payload fields take JSON numbers or numeric strings. Item
//! confidence must lie in [0, 1].
//!
//! The accumulator map is owned by the caller of [`merge`]; nothing is kept
//! between runs.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::config::ImportConfig;
use crate::error::{CatalogError, Result};
use crate::models::{IdentityKey, NutrientProfile, Portion, SourceInfo};
use crate::sources::SourceDocument;
use crate::units::to_grams;

/// Values applied when an item payload leaves a field out.
#[derive(Debug, Clone)]
pub struct MergeDefaults {
    pub locale: String,
    pub confidence: f64,
}

impl Default for MergeDefaults {
    fn default() -> Self {
        Self {
            locale: "en-US".to_string(),
            confidence: 0.8,
        }
    }
}

impl From<&ImportConfig> for MergeDefaults {
    fn from(import: &ImportConfig) -> Self {
        Self {
            locale: import.default_locale.clone(),
            confidence: import.default_confidence,
        }
    }
}

/// Accumulated state for one identity key.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRecord {
    pub name: String,
    pub brand: Option<String>,
    pub locale: String,
    pub confidence: f64,
    /// Confidence of the payload whose portions and nutrients are held.
    pub primary_confidence: f64,
    pub sources: BTreeMap<String, SourceInfo>,
    pub portions: Vec<Portion>,
    pub nutrients: NutrientProfile,
}

impl MergedRecord {
    fn first(item: ItemContent, source: SourceInfo) -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(source.name.clone(), source);
        Self {
            name: item.name,
            brand: item.brand,
            locale: item.locale,
            confidence: item.confidence,
            primary_confidence: item.confidence,
            sources,
            portions: item.portions,
            nutrients: item.nutrients,
        }
    }

    fn absorb(&mut self, item: ItemContent, source: SourceInfo) {
        self.sources.insert(source.name.clone(), source);
        if item.confidence >= self.primary_confidence {
            self.portions = item.portions;
            self.nutrients = item.nutrients;
            self.primary_confidence = item.confidence;
        }
        self.confidence = self.confidence.max(item.confidence);
    }
}

pub type MergedCatalog = BTreeMap<IdentityKey, MergedRecord>;

#[derive(Debug, Deserialize)]
struct ItemPayload {
    name: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    #[serde(default, deserialize_with = "optional_number")]
    confidence: Option<f64>,
    portions: Vec<PortionPayload>,
    nutrients_per_100g: NutrientPayload,
}

#[derive(Debug, Deserialize)]
struct PortionPayload {
    #[serde(default)]
    description: Option<String>,
    #[serde(deserialize_with = "number")]
    amount: f64,
    unit: String,
    #[serde(default, deserialize_with = "optional_number")]
    gram_weight: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NutrientPayload {
    #[serde(deserialize_with = "optional_number")]
    calories_kcal: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    protein_g: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    fat_g: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    carbs_g: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    fiber_g: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    sugar_g: Option<f64>,
    #[serde(deserialize_with = "optional_number")]
    sodium_mg: Option<f64>,
}

impl From<NutrientPayload> for NutrientProfile {
    fn from(n: NutrientPayload) -> Self {
        Self {
            calories_kcal: n.calories_kcal,
            protein_g: n.protein_g,
            fat_g: n.fat_g,
            carbs_g: n.carbs_g,
            fiber_g: n.fiber_g,
            sugar_g: n.sugar_g,
            sodium_mg: n.sodium_mg,
        }
    }
}

/// A numeric payload field: a JSON number or a string holding one.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn into_f64<E: de::Error>(self) -> std::result::Result<f64, E> {
        match self {
            NumberOrText::Number(n) => Ok(n),
            NumberOrText::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .ok_or_else(|| E::custom(format!("expected a number, found {:?}", text))),
        }
    }
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    NumberOrText::deserialize(deserializer)?.into_f64()
}

fn optional_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Option::<NumberOrText>::deserialize(deserializer)?
        .map(NumberOrText::into_f64)
        .transpose()
}

/// One payload after defaults and unit resolution.
struct ItemContent {
    name: String,
    brand: Option<String>,
    locale: String,
    confidence: f64,
    portions: Vec<Portion>,
    nutrients: NutrientProfile,
}

/// Merge all source documents, in order, into one record per identity key.
pub fn merge(sources: &[SourceDocument], defaults: &MergeDefaults) -> Result<MergedCatalog> {
    let mut merged = MergedCatalog::new();

    for doc in sources {
        let source_info = parse_source_info(doc)?;
        let invalid = |index: usize, reason: String| CatalogError::InvalidPayload {
            path: doc.path.clone(),
            message: format!("items[{}]: {}", index, reason),
        };

        for (index, raw) in doc.items().iter().enumerate() {
            let payload: ItemPayload =
                serde_json::from_value(raw.clone()).map_err(|e| invalid(index, e.to_string()))?;
            if let Some(confidence) = payload.confidence {
                if !(0.0..=1.0).contains(&confidence) {
                    return Err(invalid(
                        index,
                        format!("confidence {} is outside [0, 1]", confidence),
                    ));
                }
            }
            let item = resolve_item(payload, defaults)?;
            let key = IdentityKey::new(&item.name, item.brand.as_deref(), &item.locale);

            match merged.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(MergedRecord::first(item, source_info.clone()));
                }
                Entry::Occupied(mut slot) => {
                    slot.get_mut().absorb(item, source_info.clone());
                }
            }
        }
    }

    Ok(merged)
}

fn parse_source_info(doc: &SourceDocument) -> Result<SourceInfo> {
    serde_json::from_value(doc.source.clone()).map_err(|e| CatalogError::InvalidPayload {
        path: doc.path.clone(),
        message: format!("source: {}", e),
    })
}

fn resolve_item(payload: ItemPayload, defaults: &MergeDefaults) -> Result<ItemContent> {
    let portions = payload
        .portions
        .into_iter()
        .map(resolve_portion)
        .collect::<Result<Vec<_>>>()?;

    Ok(ItemContent {
        name: payload.name,
        brand: payload.brand,
        locale: payload.locale.unwrap_or_else(|| defaults.locale.clone()),
        confidence: payload.confidence.unwrap_or(defaults.confidence),
        portions,
        nutrients: payload.nutrients_per_100g.into(),
    })
}

fn resolve_portion(portion: PortionPayload) -> Result<Portion> {
    let gram_weight = match portion.gram_weight {
        Some(weight) => weight,
        None => to_grams(portion.amount, &portion.unit)?,
    };
    Ok(Portion {
        description: portion
            .description
            .unwrap_or_else(|| "serving".to_string()),
        amount: portion.amount,
        unit: portion.unit,
        gram_weight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::path::PathBuf;

    fn doc(source: &str, items: Value) -> SourceDocument {
        SourceDocument {
            path: PathBuf::from(format!("{}.json", source.to_lowercase())),
            source: json!({"name": source, "dataset": "test", "version": "1"}),
            items: match items {
                Value::Array(items) => items,
                other => vec![other],
            },
        }
    }

    fn banana(confidence: f64, calories: f64) -> Value {
        json!({
            "name": "Banana",
            "confidence": confidence,
            "portions": [{"description": "1 medium", "amount": 118, "unit": "g"}],
            "nutrients_per_100g": {
                "calories_kcal": calories,
                "protein_g": 1.1,
                "fat_g": 0.3,
                "carbs_g": 22.8
            }
        })
    }

    fn only(merged: &MergedCatalog) -> &MergedRecord {
        assert_eq!(merged.len(), 1);
        merged.values().next().unwrap()
    }

    #[test]
    fn same_identity_from_two_sources_merges() {
        let mut other = banana(0.7, 89.0);
        other["name"] = json!("  BANANA ");
        let merged = merge(
            &[doc("USDA", json!([banana(0.85, 89.0)])), doc("Brand", json!([other]))],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.name, "Banana");
        assert_eq!(record.sources.len(), 2);
    }

    #[test]
    fn higher_confidence_wins_regardless_of_order() {
        let defaults = MergeDefaults::default();
        let forward = merge(
            &[
                doc("A", json!([banana(0.8, 80.0)])),
                doc("B", json!([banana(0.9, 90.0)])),
            ],
            &defaults,
        )
        .unwrap();
        let backward = merge(
            &[
                doc("B", json!([banana(0.9, 90.0)])),
                doc("A", json!([banana(0.8, 80.0)])),
            ],
            &defaults,
        )
        .unwrap();

        for merged in [&forward, &backward] {
            let record = only(merged);
            assert_eq!(record.nutrients.calories_kcal, Some(90.0));
            assert_eq!(record.confidence, 0.9);
            assert_eq!(record.primary_confidence, 0.9);
        }
    }

    #[test]
    fn confidence_tie_prefers_later_source() {
        let merged = merge(
            &[
                doc("A", json!([banana(0.9, 80.0)])),
                doc("B", json!([banana(0.9, 95.0)])),
            ],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.nutrients.calories_kcal, Some(95.0));
        assert_eq!(record.confidence, 0.9);
    }

    #[test]
    fn lower_confidence_keeps_primary_but_adds_source() {
        let merged = merge(
            &[
                doc("A", json!([banana(0.9, 80.0)])),
                doc("B", json!([banana(0.5, 200.0)])),
            ],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.nutrients.calories_kcal, Some(80.0));
        assert_eq!(record.primary_confidence, 0.9);
        assert_eq!(
            record.sources.keys().cloned().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn repeated_source_name_overwrites_entry() {
        let mut second = doc("USDA", json!([banana(0.8, 89.0)]));
        second.source["version"] = json!("2");
        let merged = merge(
            &[doc("USDA", json!([banana(0.8, 89.0)])), second],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.sources.len(), 1);
        assert_eq!(record.sources["USDA"].version, "2");
    }

    #[test]
    fn defaults_fill_missing_fields() {
        let merged = merge(
            &[doc(
                "A",
                json!([{
                    "name": "Rice",
                    "portions": [{"amount": 50, "unit": "grams"}],
                    "nutrients_per_100g": {"protein_g": 2.7}
                }]),
            )],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.locale, "en-US");
        assert_eq!(record.confidence, 0.8);
        assert_eq!(record.brand, None);
        assert_eq!(record.portions[0].description, "serving");
        assert_eq!(record.portions[0].gram_weight, 50.0);
        assert_eq!(record.nutrients.protein_g, Some(2.7));
        assert_eq!(record.nutrients.carbs_g, None);
        assert_eq!(record.nutrients.calories_kcal, None);
    }

    #[test]
    fn explicit_gram_weight_skips_unit_lookup() {
        let merged = merge(
            &[doc(
                "A",
                json!([{
                    "name": "Oat Milk",
                    "portions": [
                        {"description": "1 cup", "amount": 1, "unit": "cup", "gram_weight": 244},
                        {"description": "glass", "amount": 240, "unit": "ml"}
                    ],
                    "nutrients_per_100g": {}
                }]),
            )],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.portions.len(), 2);
        assert_eq!(record.portions[0].gram_weight, 244.0);
        assert_eq!(record.portions[1].gram_weight, 240.0);
    }

    #[test]
    fn unknown_unit_aborts_merge() {
        let err = merge(
            &[doc(
                "A",
                json!([{
                    "name": "Soup",
                    "portions": [{"amount": 1, "unit": "cup"}],
                    "nutrients_per_100g": {}
                }]),
            )],
            &MergeDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::UnsupportedUnit { ref unit } if unit == "cup"));
    }

    #[test]
    fn missing_name_is_invalid_payload() {
        let err = merge(
            &[doc("A", json!([{"portions": [], "nutrients_per_100g": {}}]))],
            &MergeDefaults::default(),
        )
        .unwrap_err();
        match err {
            CatalogError::InvalidPayload { message, .. } => {
                assert!(message.starts_with("items[0]"), "{}", message)
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn distinct_locales_stay_separate() {
        let mut uk = banana(0.8, 89.0);
        uk["locale"] = json!("en-GB");
        let merged = merge(
            &[doc("A", json!([banana(0.8, 89.0), uk]))],
            &MergeDefaults::default(),
        )
        .unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let merged = merge(
            &[doc(
                "A",
                json!([{
                    "name": "Oat Milk",
                    "confidence": "0.9",
                    "portions": [
                        {"amount": "240", "unit": "ml"},
                        {"amount": 1, "unit": "cup", "gram_weight": " 244 "}
                    ],
                    "nutrients_per_100g": {"calories_kcal": "42", "protein_g": 1, "carbs_g": null}
                }]),
            )],
            &MergeDefaults::default(),
        )
        .unwrap();
        let record = only(&merged);
        assert_eq!(record.confidence, 0.9);
        assert_eq!(record.portions[0].amount, 240.0);
        assert_eq!(record.portions[0].gram_weight, 240.0);
        assert_eq!(record.portions[1].gram_weight, 244.0);
        assert_eq!(record.nutrients.calories_kcal, Some(42.0));
        assert_eq!(record.nutrients.protein_g, Some(1.0));
        assert_eq!(record.nutrients.carbs_g, None);
    }

    #[test]
    fn non_numeric_string_is_invalid_payload() {
        let mut item = banana(0.8, 89.0);
        item["nutrients_per_100g"]["fat_g"] = json!("a little");
        let err = merge(&[doc("A", json!([item]))], &MergeDefaults::default()).unwrap_err();
        match err {
            CatalogError::InvalidPayload { message, .. } => {
                assert!(message.starts_with("items[0]"), "{}", message);
                assert!(message.contains("a little"), "{}", message);
            }
            other => panic!("expected InvalidPayload, got {:?}", other),
        }
    }

    #[test]
    fn out_of_range_confidence_is_invalid_payload() {
        for confidence in [json!(7.5), json!(-0.1), json!("1.01")] {
            let mut item = banana(0.8, 89.0);
            item["confidence"] = confidence;
            let err = merge(
                &[doc("A", json!([banana(0.8, 89.0), item]))],
                &MergeDefaults::default(),
            )
            .unwrap_err();
            match err {
                CatalogError::InvalidPayload { message, .. } => {
                    assert!(message.starts_with("items[1]: confidence"), "{}", message)
                }
                other => panic!("expected InvalidPayload, got {:?}", other),
            }
        }
    }

    #[test]
    fn boundary_confidence_is_accepted() {
        let merged = merge(
            &[doc("A", json!([banana(0.0, 80.0)])), doc("B", json!([banana(1.0, 90.0)]))],
            &MergeDefaults::default(),
        )
        .unwrap();
        assert_eq!(only(&merged).confidence, 1.0);
    }
}
