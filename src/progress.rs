//! Import progress reporting.
//!
//! Reports what `catalog import` is doing: which sources are loading, how
//! many items merged, how versioning came out, and where the catalog was
//! written. Progress goes to **stderr** so stdout remains parseable for
//! scripts.

use std::io::Write;

/// A single progress event for an import run.
#[derive(Clone, Debug)]
pub enum ImportProgressEvent {
    /// A source file is being read.
    Loading { path: String },
    /// All sources merged into `items` distinct identity keys.
    Merged { sources: u64, items: u64 },
    /// Revision outcome across the merged items.
    Versioned {
        new: u64,
        changed: u64,
        unchanged: u64,
    },
    /// Validation finished with these counts.
    Validated { errors: u64, warnings: u64 },
    /// Catalog written (or, on a dry run, left untouched).
    Finished {
        path: String,
        items: u64,
        dry_run: bool,
    },
}

/// Reports import progress. Implementations write to stderr (human or JSON).
pub trait ImportProgressReporter {
    fn report(&self, event: ImportProgressEvent);
}

/// Human-friendly progress on stderr: "import  merged  1,234 items from 3 sources".
pub struct StderrProgress;

impl ImportProgressReporter for StderrProgress {
    fn report(&self, event: ImportProgressEvent) {
        let line = match &event {
            ImportProgressEvent::Loading { path } => format!("import  loading  {}\n", path),
            ImportProgressEvent::Merged { sources, items } => format!(
                "import  merged  {} items from {} sources\n",
                format_number(*items),
                format_number(*sources)
            ),
            ImportProgressEvent::Versioned {
                new,
                changed,
                unchanged,
            } => format!(
                "import  versioned  {} new, {} changed, {} unchanged\n",
                format_number(*new),
                format_number(*changed),
                format_number(*unchanged)
            ),
            ImportProgressEvent::Validated { errors, warnings } => format!(
                "import  validated  {} errors, {} warnings\n",
                format_number(*errors),
                format_number(*warnings)
            ),
            ImportProgressEvent::Finished {
                path,
                items,
                dry_run,
            } => {
                if *dry_run {
                    format!(
                        "import  dry-run  {} items, {} not written\n",
                        format_number(*items),
                        path
                    )
                } else {
                    format!("import  wrote  {} items to {}\n", format_number(*items), path)
                }
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ImportProgressReporter for JsonProgress {
    fn report(&self, event: ImportProgressEvent) {
        let obj = match &event {
            ImportProgressEvent::Loading { path } => serde_json::json!({
                "event": "progress",
                "phase": "loading",
                "path": path
            }),
            ImportProgressEvent::Merged { sources, items } => serde_json::json!({
                "event": "progress",
                "phase": "merged",
                "sources": sources,
                "items": items
            }),
            ImportProgressEvent::Versioned {
                new,
                changed,
                unchanged,
            } => serde_json::json!({
                "event": "progress",
                "phase": "versioned",
                "new": new,
                "changed": changed,
                "unchanged": unchanged
            }),
            ImportProgressEvent::Validated { errors, warnings } => serde_json::json!({
                "event": "progress",
                "phase": "validated",
                "errors": errors,
                "warnings": warnings
            }),
            ImportProgressEvent::Finished {
                path,
                items,
                dry_run,
            } => serde_json::json!({
                "event": "progress",
                "phase": "finished",
                "path": path,
                "items": items,
                "dry_run": dry_run
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ImportProgressReporter for NoProgress {
    fn report(&self, _event: ImportProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ImportProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
