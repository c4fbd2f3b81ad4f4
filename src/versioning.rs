//! Content hashing and revision assignment.
//!
//! The content hash covers only the catalog-visible fields of a merged
//! record (`name`, `brand`, `locale`, `confidence`, `portions`,
//! `nutrients_per_100g`). The item id, its sources and its version are
//! excluded, so re-importing unchanged data reproduces the same hash.
//!
//! Canonical form: compact JSON, object keys sorted bytewise, `,` and `:`
//! separators, no whitespace. Keys are sorted here rather than relying on
//! the map type behind `serde_json::Value`.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::merge::MergedRecord;
use crate::models::{FoodItem, IdentityKey, VersionInfo};

/// How an item's content compares with the previously published catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    New,
    Changed,
    Unchanged,
}

/// Identity and version assigned to a merged record.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned {
    pub id: String,
    pub version: VersionInfo,
    pub status: ChangeStatus,
}

/// Catalog-visible content of a record as a JSON value.
pub fn content_payload(record: &MergedRecord) -> Value {
    json!({
        "name": record.name,
        "brand": record.brand,
        "locale": record.locale,
        "confidence": record.confidence,
        "portions": record.portions,
        "nutrients_per_100g": record.nutrients,
    })
}

/// Serialize a JSON value with sorted keys and no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, val) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(val, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Hex-encoded SHA-256 of the record's canonical content.
pub fn content_hash(record: &MergedRecord) -> String {
    let canonical = canonical_json(&content_payload(record));
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Assign id and revision for `record` against the prior catalog.
///
/// Known keys keep their id; the revision moves up by one only when the
/// content hash differs. New keys get a fresh UUID and revision 1.
pub fn compute_version(
    key: &IdentityKey,
    record: &MergedRecord,
    prior: &BTreeMap<IdentityKey, FoodItem>,
    now: DateTime<Utc>,
) -> Versioned {
    let hash = content_hash(record);

    let (id, revision, status) = match prior.get(key) {
        Some(existing) if existing.version.content_hash == hash => (
            existing.id.clone(),
            existing.version.revision,
            ChangeStatus::Unchanged,
        ),
        Some(existing) => (
            existing.id.clone(),
            existing.version.revision + 1,
            ChangeStatus::Changed,
        ),
        None => (Uuid::new_v4().to_string(), 1, ChangeStatus::New),
    };

    Versioned {
        id,
        version: VersionInfo {
            revision,
            content_hash: hash,
            updated_at: now,
        },
        status,
    }
}
