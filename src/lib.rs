//! # Nutrition Catalog
//!
//! Ingestion pipeline for a nutrition catalog: reads one or more source
//! documents, merges entries describing the same food item, assigns
//! content-addressed revisions, validates nutrient data, and publishes a
//! single canonical catalog file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌─────────┐   ┌────────────┐   ┌──────────┐   ┌─────────┐
//! │ Sources  │──▶│  Merge  │──▶│ Versioning │──▶│ Validate │──▶│ Catalog │
//! │ (JSON)   │   │ by key  │   │  SHA-256   │   │  gate    │   │ (JSON)  │
//! └──────────┘   └────┬────┘   └─────▲──────┘   └──────────┘   └────┬────┘
//!                     │              │ prior ids/hashes             │
//!                  units             └──────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! catalog import --source data/sources/usda.json --source data/sources/brand.json \
//!     --output data/catalog.json
//! catalog stats --catalog data/catalog.json
//! catalog get Banana --catalog data/catalog.json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`units`] | Unit aliases and gram conversion |
//! | [`sources`] | Source document loading |
//! | [`merge`] | Multi-source merge by identity key |
//! | [`versioning`] | Content hashing and revisions |
//! | [`validate`] | Nutrient sanity rules |
//! | [`catalog`] | Catalog artifact load/write |
//! | [`ingest`] | Pipeline orchestration |
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Pipeline error type |
//! | [`progress`] | Progress reporting on stderr |

pub mod catalog;
pub mod config;
pub mod error;
pub mod get;
pub mod ingest;
pub mod merge;
pub mod models;
pub mod progress;
pub mod sources;
pub mod stats;
pub mod units;
pub mod validate;
pub mod versioning;

pub use error::{CatalogError, Result};
