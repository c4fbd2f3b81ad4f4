//! Catalog statistics and health overview.
//!
//! Provides a quick summary of a published catalog: item counts, per-locale
//! and per-source breakdowns, and how many revisions items have gone
//! through. Used by `catalog stats` to confirm imports landed as expected.

use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog;
use crate::models::FoodItem;

/// Aggregated counts over a catalog.
#[derive(Debug, Default, PartialEq)]
pub struct CatalogStats {
    pub total: usize,
    pub by_locale: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub by_revision: BTreeMap<u64, usize>,
    pub last_updated: Option<i64>,
}

pub fn collect<'a>(items: impl IntoIterator<Item = &'a FoodItem>) -> CatalogStats {
    let mut stats = CatalogStats::default();
    for item in items {
        stats.total += 1;
        *stats.by_locale.entry(item.locale.clone()).or_default() += 1;
        for source in &item.sources {
            *stats.by_source.entry(source.name.clone()).or_default() += 1;
        }
        *stats.by_revision.entry(item.version.revision).or_default() += 1;

        let ts = item.version.updated_at.timestamp();
        stats.last_updated = Some(stats.last_updated.map_or(ts, |cur| cur.max(ts)));
    }
    stats
}

/// Run the stats command: load the catalog and print a summary.
pub fn run_stats(path: &Path) -> Result<()> {
    let items = catalog::load(path)?;
    let stats = collect(items.values());

    let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    println!("Nutrition Catalog — Stats");
    println!("=========================");
    println!();
    println!("  Catalog:     {}", path.display());
    println!("  Size:        {}", format_bytes(size));
    println!("  Items:       {}", stats.total);
    println!(
        "  Updated:     {}",
        stats
            .last_updated
            .map(format_ts_relative)
            .unwrap_or_else(|| "never".to_string())
    );

    if !stats.by_locale.is_empty() {
        println!();
        println!("  By locale:");
        for (locale, count) in &stats.by_locale {
            println!("  {:<24} {:>6}", locale, count);
        }
    }

    if !stats.by_source.is_empty() {
        println!();
        println!("  By source:");
        for (source, count) in &stats.by_source {
            println!("  {:<24} {:>6}", source, count);
        }
    }

    if !stats.by_revision.is_empty() {
        println!();
        println!("  By revision:");
        for (revision, count) in &stats.by_revision {
            println!("  {:<24} {:>6}", format!("r{}", revision), count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NutrientProfile, SourceInfo, VersionInfo};
    use chrono::{TimeZone, Utc};

    fn item(locale: &str, sources: &[&str], revision: u64, day: u32) -> FoodItem {
        FoodItem {
            id: format!("{}-{}", locale, revision),
            name: "x".to_string(),
            brand: None,
            locale: locale.to_string(),
            confidence: 0.8,
            sources: sources
                .iter()
                .map(|s| SourceInfo {
                    name: s.to_string(),
                    dataset: "d".to_string(),
                    version: "1".to_string(),
                    url: None,
                })
                .collect(),
            portions: vec![],
            nutrients_per_100g: NutrientProfile::default(),
            version: VersionInfo {
                revision,
                content_hash: String::new(),
                updated_at: Utc.with_ymd_and_hms(2026, 3, day, 0, 0, 0).unwrap(),
            },
        }
    }

    #[test]
    fn collect_counts_breakdowns() {
        let items = vec![
            item("en-US", &["USDA", "Brand"], 1, 1),
            item("en-US", &["USDA"], 2, 5),
            item("en-GB", &["Brand"], 1, 3),
        ];
        let stats = collect(&items);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_locale["en-US"], 2);
        assert_eq!(stats.by_source["USDA"], 2);
        assert_eq!(stats.by_source["Brand"], 2);
        assert_eq!(stats.by_revision[&1], 2);
        assert_eq!(
            stats.last_updated,
            Some(Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap().timestamp())
        );
    }

    #[test]
    fn empty_catalog_stats() {
        let stats = collect(Vec::<FoodItem>::new().iter());
        assert_eq!(stats, CatalogStats::default());
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
