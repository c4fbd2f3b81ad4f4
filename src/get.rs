//! Catalog item lookup.
//!
//! Finds items in a published catalog by id or by name. Used by the
//! `catalog get` CLI command.

use anyhow::{bail, Result};
use std::path::Path;

use crate::catalog;
use crate::models::FoodItem;

/// Items matching `query`: the item whose id equals it, otherwise every
/// item whose name matches case-insensitively.
pub fn find_items(items: &[FoodItem], query: &str) -> Vec<FoodItem> {
    if let Some(item) = items.iter().find(|i| i.id == query) {
        return vec![item.clone()];
    }

    let needle = query.trim().to_lowercase();
    items
        .iter()
        .filter(|i| i.name.trim().to_lowercase() == needle)
        .cloned()
        .collect()
}

/// CLI entry point: looks up `query` and prints each match to stdout.
pub fn run_get(path: &Path, query: &str) -> Result<()> {
    let items: Vec<FoodItem> = catalog::load(path)?.into_values().collect();
    let matches = find_items(&items, query);
    if matches.is_empty() {
        bail!("item not found: {}", query);
    }

    for item in &matches {
        print_item(item);
    }
    Ok(())
}

fn print_item(item: &FoodItem) {
    println!("--- Item ---");
    println!("id:           {}", item.id);
    println!("name:         {}", item.name);
    if let Some(ref brand) = item.brand {
        println!("brand:        {}", brand);
    }
    println!("locale:       {}", item.locale);
    println!("confidence:   {}", item.confidence);
    println!("revision:     {}", item.version.revision);
    println!("content_hash: {}", item.version.content_hash);
    println!(
        "updated_at:   {}",
        item.version.updated_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    println!();

    let n = &item.nutrients_per_100g;
    println!("--- Nutrients per 100g ---");
    for (label, value) in [
        ("calories_kcal", n.calories_kcal),
        ("protein_g", n.protein_g),
        ("fat_g", n.fat_g),
        ("carbs_g", n.carbs_g),
        ("fiber_g", n.fiber_g),
        ("sugar_g", n.sugar_g),
        ("sodium_mg", n.sodium_mg),
    ] {
        match value {
            Some(v) => println!("{:<14}{}", label, v),
            None => println!("{:<14}unknown", label),
        }
    }
    println!();

    println!("--- Portions ({}) ---", item.portions.len());
    for portion in &item.portions {
        println!(
            "{}: {} {} = {} g",
            portion.description, portion.amount, portion.unit, portion.gram_weight
        );
    }
    println!();

    println!("--- Sources ({}) ---", item.sources.len());
    for source in &item.sources {
        match source.url {
            Some(ref url) => println!(
                "{} ({} {}) {}",
                source.name, source.dataset, source.version, url
            ),
            None => println!("{} ({} {})", source.name, source.dataset, source.version),
        }
    }
    println!();
}
