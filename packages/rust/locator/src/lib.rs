//! Input document discovery.
//!
//! Resolves a user-supplied path (single file or directory) into an ordered,
//! deduplicated set of eligible order documents. Transient lock/temp
//! artifacts of the editing application are filtered out, and directory
//! results are sorted by path so identical inputs produce identical runs;
//! downstream timestamped outputs and diagnostics depend on this ordering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use orderdesk_shared::{DocFormat, Document, OrderdeskError, Result};

/// File-name prefixes that mark transient editing artifacts (office lock
/// files and editor temp files).
const TRANSIENT_PREFIXES: &[&str] = &["~$", ".~"];

/// Resolve an input path into the ordered document set.
///
/// A single eligible file yields a one-element sequence. A directory is
/// enumerated recursively; the result is sorted by path and deduplicated on
/// the canonicalized path. Fails with [`OrderdeskError::InputNotFound`] when
/// the path is neither an eligible file nor a directory, or when a directory
/// yields zero eligible documents.
#[instrument(skip_all, fields(input = %input.display()))]
pub fn collect_documents(input: &Path, extensions: &[String]) -> Result<Vec<Document>> {
    if input.is_file() {
        return match to_document(input, extensions) {
            Some(doc) => Ok(vec![doc]),
            None => Err(OrderdeskError::input_not_found(input)),
        };
    }

    if input.is_dir() {
        // Keyed by canonical path: deduplicates aliases (symlinks, `.`
        // segments) while the BTreeMap keeps deterministic ordering.
        let mut found: BTreeMap<PathBuf, Document> = BTreeMap::new();
        walk_dir(input, extensions, &mut found)?;

        if found.is_empty() {
            return Err(OrderdeskError::input_not_found(input));
        }

        let mut documents: Vec<Document> = found.into_values().collect();
        documents.sort_by(|a, b| a.path.cmp(&b.path));

        debug!(count = documents.len(), "documents discovered");
        return Ok(documents);
    }

    Err(OrderdeskError::input_not_found(input))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Whether a file name marks a transient lock/temp artifact.
fn is_transient_artifact(name: &str) -> bool {
    TRANSIENT_PREFIXES.iter().any(|p| name.starts_with(p))
}

/// Build a [`Document`] if the path is an eligible order document.
fn to_document(path: &Path, extensions: &[String]) -> Option<Document> {
    let name = path.file_name()?.to_str()?;
    if is_transient_artifact(name) {
        return None;
    }

    let ext = path.extension()?.to_str()?.to_lowercase();
    if !extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext)) {
        return None;
    }

    Some(Document {
        path: path.to_path_buf(),
        format: DocFormat::from_extension(&ext),
    })
}

/// Recursively enumerate eligible documents beneath `dir`.
fn walk_dir(
    dir: &Path,
    extensions: &[String],
    found: &mut BTreeMap<PathBuf, Document>,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| OrderdeskError::io(dir, e))?;

    for entry in entries {
        let entry = entry.map_err(|e| OrderdeskError::io(dir, e))?;
        let path = entry.path();

        if path.is_dir() {
            walk_dir(&path, extensions, found)?;
        } else if let Some(doc) = to_document(&path, extensions) {
            let key = match std::fs::canonicalize(&path) {
                Ok(canonical) => canonical,
                Err(e) => {
                    // Entry vanished between read_dir and canonicalize.
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            found.entry(key).or_insert(doc);
        }
    }

    Ok(())
}
