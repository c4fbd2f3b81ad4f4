//! # Nutrition Catalog CLI (`catalog`)
//!
//! The `catalog` binary drives the ingestion pipeline and inspects the
//! catalogs it produces.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `catalog import` | Merge sources into the catalog file |
//! | `catalog sources` | Check source files and list their metadata |
//! | `catalog stats` | Summarize a published catalog |
//! | `catalog get <id-or-name>` | Print catalog items |
//!
//! ## Exit codes
//!
//! `import` and `sources` exit with 2 when a source cannot be loaded, 3 on
//! an unsupported unit, 4 when validation blocks publication, and 5 when
//! the catalog file itself cannot be read or written.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use nutri_catalog::config::{self, Config};
use nutri_catalog::progress::ProgressMode;
use nutri_catalog::versioning::ChangeStatus;
use nutri_catalog::{get, ingest, sources, stats, CatalogError};

/// Nutrition catalog ingestion: merge, version, validate and publish
/// food items from multiple sources.
#[derive(Parser)]
#[command(name = "catalog", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Built-in defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import source documents into the catalog.
    ///
    /// Loads every source, merges items by (name, brand, locale), assigns
    /// revisions against the existing catalog at the output path, validates
    /// nutrients, and rewrites the catalog. Nothing is written on failure.
    Import {
        /// Source JSON file or directory. Repeat for multiple sources;
        /// later sources win confidence ties.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,

        /// Catalog file to read prior revisions from and write to.
        /// Defaults to `[catalog].output` from config.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Run the whole pipeline but leave the catalog file untouched.
        #[arg(long)]
        dry_run: bool,

        /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Load source documents and list their metadata.
    Sources {
        /// Source JSON file or directory.
        #[arg(long = "source", required = true)]
        sources: Vec<PathBuf>,
    },

    /// Summarize a published catalog.
    Stats {
        /// Catalog file. Defaults to `[catalog].output` from config.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Print catalog items by id or name.
    Get {
        /// Item id, or a name matched case-insensitively.
        query: String,

        /// Catalog file. Defaults to `[catalog].output` from config.
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Import {
            sources,
            output,
            dry_run,
            progress,
        } => {
            let output = output.unwrap_or_else(|| cfg.catalog.output.clone());
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            run_import(&cfg, &sources, &output, dry_run, mode);
        }
        Commands::Sources { sources: paths } => {
            if let Err(e) = sources::list_sources(&paths, &cfg.import) {
                fail(&e);
            }
        }
        Commands::Stats { catalog } => {
            let path = catalog.unwrap_or_else(|| cfg.catalog.output.clone());
            stats::run_stats(&path)?;
        }
        Commands::Get { query, catalog } => {
            let path = catalog.unwrap_or_else(|| cfg.catalog.output.clone());
            get::run_get(&path, &query)?;
        }
    }

    Ok(())
}

fn run_import(
    cfg: &Config,
    sources: &[PathBuf],
    output: &Path,
    dry_run: bool,
    mode: ProgressMode,
) {
    let reporter = mode.reporter();
    let report = match ingest::run_import(sources, output, cfg, dry_run, reporter.as_ref()) {
        Ok(r) => r,
        Err(e) => fail(&e),
    };
    let outcome = &report.outcome;

    if report.dry_run {
        println!("import (dry-run)");
        println!("  items: {}", report.item_count());
    } else {
        println!(
            "Imported {} items into {}",
            report.item_count(),
            report.output.display()
        );
    }
    println!("  new: {}", outcome.count(ChangeStatus::New));
    println!("  changed: {}", outcome.count(ChangeStatus::Changed));
    println!("  unchanged: {}", outcome.count(ChangeStatus::Unchanged));
    println!("  warnings: {}", outcome.warnings.len());

    for issue in &outcome.warnings {
        eprintln!("warning: {}: {}", issue.item_id, issue.message);
    }
}

/// Report a pipeline failure on stderr and exit with its code.
fn fail(e: &CatalogError) -> ! {
    eprintln!("error[{}]: {}", e.kind(), e);
    for issue in e.issues() {
        eprintln!("  {}", issue);
    }
    std::process::exit(e.exit_code() as i32);
}
