//! Static slot→source-field mapping and the template-sources registry.
//!
//! Both files are auto-created with defaults on first use: a missing mapping
//! file must never hard-fail a first run. Creation happens only through the
//! explicit [`ensure_initialized`] bootstrap invoked once at startup; no
//! deeper logic mutates the filesystem implicitly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use orderdesk_artifacts::write_json_atomic;
use orderdesk_shared::{OrderdeskError, Result};

/// Slots every default template and mapping covers.
pub const DEFAULT_SLOTS: &[&str] = &["full_name", "doc_number", "order_ref", "order_date"];

/// Rule-set file name under the autofill config directory. Read-only input;
/// never auto-created.
const RULES_FILE_NAME: &str = "doc_number_rules.json";

// ---------------------------------------------------------------------------
// Mapping configuration
// ---------------------------------------------------------------------------

/// Declares which source field feeds each template slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingConfig {
    /// slot name → source field name.
    pub slots: BTreeMap<String, String>,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            slots: DEFAULT_SLOTS
                .iter()
                .map(|s| (s.to_string(), s.to_string()))
                .collect(),
        }
    }
}

impl MappingConfig {
    /// Source field for a slot. Slots without an explicit rule read the
    /// same-named record field.
    pub fn source_field<'a>(&'a self, slot: &'a str) -> &'a str {
        self.slots.get(slot).map(String::as_str).unwrap_or(slot)
    }
}

/// Load a mapping file. A missing file yields the defaults (the bootstrap
/// creates it, but a read-only configuration directory must still work).
pub fn load_mapping(path: &Path) -> Result<MappingConfig> {
    if !path.exists() {
        debug!(?path, "mapping file not found, using defaults");
        return Ok(MappingConfig::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| OrderdeskError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| OrderdeskError::parse(format!("invalid mapping {}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// Template sources registry
// ---------------------------------------------------------------------------

/// One registered template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSourceEntry {
    /// Registry name.
    pub name: String,
    /// Path to the template descriptor.
    pub path: String,
}

/// Registry of known template descriptors, auto-created alongside the
/// mapping file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSources {
    pub templates: Vec<TemplateSourceEntry>,
}

impl Default for TemplateSources {
    fn default() -> Self {
        Self {
            templates: vec![TemplateSourceEntry {
                name: "standard".into(),
                path: "templates/standard.json".into(),
            }],
        }
    }
}

// ---------------------------------------------------------------------------
// Ensure-initialized bootstrap
// ---------------------------------------------------------------------------

/// Resolved configuration handles for one run.
#[derive(Debug, Clone)]
pub struct AutofillPaths {
    pub mapping_path: PathBuf,
    pub template_sources_path: PathBuf,
    pub rules_path: PathBuf,
    pub learning_dir: PathBuf,
}

/// Idempotent startup bootstrap: create the autofill configuration layout
/// under `config_dir` and return the resolved handles.
///
/// Creates `autofill/mapping.json` and `autofill/template_sources.json`
/// with defaults when absent, and the learning-store directory. The rule
/// set is a read-only input and is never created here.
pub fn ensure_initialized(config_dir: &Path) -> Result<AutofillPaths> {
    let autofill_dir = config_dir.join("autofill");
    let learning_dir = config_dir.join("learning");

    for dir in [&autofill_dir, &learning_dir] {
        std::fs::create_dir_all(dir).map_err(|e| OrderdeskError::io(dir, e))?;
    }

    let paths = AutofillPaths {
        mapping_path: autofill_dir.join("mapping.json"),
        template_sources_path: autofill_dir.join("template_sources.json"),
        rules_path: autofill_dir.join(RULES_FILE_NAME),
        learning_dir,
    };

    if !paths.mapping_path.exists() {
        write_json_atomic(&paths.mapping_path, &MappingConfig::default())?;
        info!(path = %paths.mapping_path.display(), "created default mapping file");
    }

    if !paths.template_sources_path.exists() {
        write_json_atomic(&paths.template_sources_path, &TemplateSources::default())?;
        info!(
            path = %paths.template_sources_path.display(),
            "created default template-sources file"
        );
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "orderdesk-mapping-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn default_mapping_is_identity_over_default_slots() {
        let mapping = MappingConfig::default();
        for slot in DEFAULT_SLOTS {
            assert_eq!(mapping.source_field(slot), *slot);
        }
        // Unknown slots fall back to the slot name itself.
        assert_eq!(mapping.source_field("rank"), "rank");
    }

    #[test]
    fn ensure_initialized_creates_defaults_once() {
        let tmp = temp_dir("ensure");

        let paths = ensure_initialized(&tmp).unwrap();
        assert!(paths.mapping_path.exists());
        assert!(paths.template_sources_path.exists());
        assert!(paths.learning_dir.is_dir());
        assert!(!paths.rules_path.exists());

        // Second call is a no-op on existing content.
        std::fs::write(&paths.mapping_path, r#"{"slots":{"full_name":"name"}}"#).unwrap();
        let again = ensure_initialized(&tmp).unwrap();
        let mapping = load_mapping(&again.mapping_path).unwrap();
        assert_eq!(mapping.source_field("full_name"), "name");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_mapping_missing_file_yields_defaults() {
        let tmp = temp_dir("missing");
        let mapping = load_mapping(&tmp.join("mapping.json")).unwrap();
        assert_eq!(mapping.slots.len(), DEFAULT_SLOTS.len());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_mapping_rejects_malformed_json() {
        let tmp = temp_dir("malformed");
        let path = tmp.join("mapping.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = load_mapping(&path).unwrap_err();
        assert!(matches!(err, OrderdeskError::Parse { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
