//! Run output artifacts: combined export, plain-text summary, diagnostics.
//!
//! Each output kind gets its own subdirectory under the output root, and
//! every file name is qualified by the run timestamp so concurrent runs
//! never collide on output paths. All writes go through an atomic
//! temp-then-rename path. The three outputs are independent: producing one
//! never depends on another, and an empty diagnostics list is a valid,
//! successful outcome.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use orderdesk_shared::{Combined, Diagnostic, OrderdeskError, Result};

// ---------------------------------------------------------------------------
// Run timestamp & output layout
// ---------------------------------------------------------------------------

/// Timestamp qualifying every artifact of one run (`YYYYMMDD_HHMMSS`),
/// fixed once at run start.
pub fn run_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Output directory layout under the output root.
///
/// ```text
/// <output_root>/
/// ├── exports/
/// │   ├── json/       combined_<ts>.json
/// │   ├── txt/        summary_<ts>.txt
/// │   └── sheets/     filled_<template>_<ts>.json
/// └── diagnostics/    unknowns_<ts>.json
/// ```
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub json_dir: PathBuf,
    pub txt_dir: PathBuf,
    pub sheets_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
}

impl OutputLayout {
    /// Create the layout directories under `output_root`.
    pub fn create(output_root: &Path) -> Result<Self> {
        let layout = Self {
            json_dir: output_root.join("exports").join("json"),
            txt_dir: output_root.join("exports").join("txt"),
            sheets_dir: output_root.join("exports").join("sheets"),
            diagnostics_dir: output_root.join("diagnostics"),
        };

        for dir in [
            &layout.json_dir,
            &layout.txt_dir,
            &layout.sheets_dir,
            &layout.diagnostics_dir,
        ] {
            std::fs::create_dir_all(dir).map_err(|e| OrderdeskError::io(dir, e))?;
        }

        debug!(root = %output_root.display(), "output layout created");
        Ok(layout)
    }

    /// Path of the combined JSON export for this run.
    pub fn combined_path(&self, stamp: &str) -> PathBuf {
        self.json_dir.join(format!("combined_{stamp}.json"))
    }

    /// Path of the plain-text summary for this run.
    pub fn summary_path(&self, stamp: &str) -> PathBuf {
        self.txt_dir.join(format!("summary_{stamp}.txt"))
    }

    /// Path of the diagnostics artifact for this run.
    pub fn diagnostics_path(&self, stamp: &str) -> PathBuf {
        self.diagnostics_dir.join(format!("unknowns_{stamp}.json"))
    }
}

// ---------------------------------------------------------------------------
// Atomic write helpers
// ---------------------------------------------------------------------------

/// Write a JSON file (pretty-printed) atomically: temp file, then rename.
pub fn write_json_atomic<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| OrderdeskError::validation(format!("JSON serialization failed: {e}")))?;
    write_text_atomic(path, &json)
}

/// Write a text file atomically: temp file, then rename.
pub fn write_text_atomic(path: &Path, content: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| OrderdeskError::validation(format!("no parent dir for {path:?}")))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| OrderdeskError::validation(format!("bad file name for {path:?}")))?;

    let temp = parent.join(format!(".{file_name}.tmp"));
    std::fs::write(&temp, content).map_err(|e| OrderdeskError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| OrderdeskError::io(path, e))?;

    debug!(path = %path.display(), size = content.len(), "wrote artifact");
    Ok(())
}

// ---------------------------------------------------------------------------
// Exports
// ---------------------------------------------------------------------------

/// Serialize the combined result to its structured export.
pub fn export_combined(combined: &Combined, path: &Path) -> Result<()> {
    write_json_atomic(path, combined)?;
    info!(path = %path.display(), "combined export written");
    Ok(())
}

/// Render the plain-text summary of a combined result.
///
/// Line format: document count, person count, then one line per document
/// with its order reference and record count.
pub fn summary_text(combined: &Combined) -> String {
    let mut lines = vec![
        format!("DOCUMENTS: {}", combined.documents.len()),
        format!("PEOPLE: {}", combined.people.len()),
    ];
    for doc in &combined.documents {
        lines.push(format!(
            "- {}: order {} records {}",
            doc.source_path,
            doc.order_ref.as_deref().unwrap_or("-"),
            doc.record_count
        ));
    }
    lines.join("\n")
}

/// Write the plain-text summary export.
pub fn export_summary(combined: &Combined, path: &Path) -> Result<()> {
    write_text_atomic(path, &summary_text(combined))?;
    info!(path = %path.display(), "summary written");
    Ok(())
}

/// Serialize the diagnostics record. An empty list is written as `[]`.
pub fn write_diagnostics(diagnostics: &[Diagnostic], path: &Path) -> Result<()> {
    write_json_atomic(path, &diagnostics)?;
    info!(
        path = %path.display(),
        count = diagnostics.len(),
        "diagnostics written"
    );
    Ok(())
}
