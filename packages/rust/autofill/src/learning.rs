//! Persisted learning store.
//!
//! Remembers previously confirmed resolutions of ambiguous raw inputs so
//! future runs resolve them without re-deriving. One JSON file per field
//! class under the learning directory, each a sorted raw→resolved map.
//!
//! Discipline: read at resolver start, written once at end of resolve, and
//! only for classes that actually gained entries. The store offers no
//! concurrent-writer protection: concurrent runs sharing a configuration
//! directory race on these files with last-writer-wins outcome, an accepted
//! limitation the caller must handle (e.g. external file locking) if it
//! matters.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use orderdesk_artifacts::write_json_atomic;
use orderdesk_shared::{OrderdeskError, Result};

/// In-memory view of the learning directory.
#[derive(Debug)]
pub struct LearningStore {
    dir: PathBuf,
    classes: BTreeMap<String, BTreeMap<String, String>>,
    dirty: BTreeSet<String>,
}

impl LearningStore {
    /// Read every `<class>.json` under `dir`. A missing directory is an
    /// empty store.
    #[instrument(skip_all, fields(dir = %dir.display()))]
    pub fn open(dir: &Path) -> Result<Self> {
        let mut classes = BTreeMap::new();

        if dir.is_dir() {
            let entries = std::fs::read_dir(dir).map_err(|e| OrderdeskError::io(dir, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| OrderdeskError::io(dir, e))?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let Some(class) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };

                let content =
                    std::fs::read_to_string(&path).map_err(|e| OrderdeskError::io(&path, e))?;
                let map: BTreeMap<String, String> = serde_json::from_str(&content).map_err(|e| {
                    OrderdeskError::parse(format!("invalid learning file {}: {e}", path.display()))
                })?;

                debug!(class, entries = map.len(), "learning file loaded");
                classes.insert(class.to_string(), map);
            }
        }

        Ok(Self {
            dir: dir.to_path_buf(),
            classes,
            dirty: BTreeSet::new(),
        })
    }

    /// Previously confirmed resolution for a raw input, if any.
    pub fn lookup(&self, class: &str, raw: &str) -> Option<&str> {
        self.classes.get(class)?.get(raw).map(String::as_str)
    }

    /// Record a derived resolution, idempotently.
    ///
    /// An existing entry always wins: learning the same raw input twice
    /// never duplicates, and a conflicting derivation is discarded in favor
    /// of the stored value. Returns the canonical resolution.
    pub fn learn(&mut self, class: &str, raw: &str, resolved: &str) -> String {
        let map = self.classes.entry(class.to_string()).or_default();
        match map.get(raw) {
            Some(existing) => existing.clone(),
            None => {
                map.insert(raw.to_string(), resolved.to_string());
                self.dirty.insert(class.to_string());
                resolved.to_string()
            }
        }
    }

    /// Number of entries recorded for a class.
    pub fn len(&self, class: &str) -> usize {
        self.classes.get(class).map_or(0, BTreeMap::len)
    }

    /// Whether any class gained entries since open.
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Write back every class that gained entries. A clean store touches
    /// nothing on disk.
    #[instrument(skip_all, fields(dir = %self.dir.display(), dirty = self.dirty.len()))]
    pub fn persist(&mut self) -> Result<()> {
        if self.dirty.is_empty() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| OrderdeskError::io(&self.dir, e))?;

        for class in &self.dirty {
            let path = self.dir.join(format!("{class}.json"));
            write_json_atomic(&path, &self.classes[class])?;
            debug!(class = %class, entries = self.classes[class].len(), "learning file written");
        }

        self.dirty.clear();
        Ok(())
    }
}
