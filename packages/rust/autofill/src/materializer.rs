//! Template Materializer collaborator.
//!
//! Takes resolved slot values plus a template descriptor and produces the
//! filled artifact. The core depends only on this input contract; the
//! bundled [`SheetWriter`] emits a filled-sheet JSON model (columns in
//! template order, one row per record). A binary-spreadsheet materializer
//! plugs in behind the same trait.

use std::path::{Path, PathBuf};

use tracing::info;

use orderdesk_artifacts::write_json_atomic;
use orderdesk_shared::Result;

use crate::resolver::Resolution;
use crate::template::TemplateDescriptor;

/// Produces the filled artifact from resolved slot values.
pub trait TemplateMaterializer {
    /// Materialize one run's resolution into `output_dir`, returning the
    /// artifact path. `stamp` qualifies the file name with the run
    /// timestamp.
    fn materialize(
        &self,
        resolution: &Resolution,
        template: &TemplateDescriptor,
        output_dir: &Path,
        stamp: &str,
    ) -> Result<PathBuf>;
}

/// Bundled materializer: a filled-sheet JSON artifact.
///
/// Unknown slots render as empty cells so the sheet shape stays identical
/// across runs regardless of resolution gaps.
#[derive(Debug, Default)]
pub struct SheetWriter;

impl SheetWriter {
    pub fn new() -> Self {
        Self
    }
}

impl TemplateMaterializer for SheetWriter {
    fn materialize(
        &self,
        resolution: &Resolution,
        template: &TemplateDescriptor,
        output_dir: &Path,
        stamp: &str,
    ) -> Result<PathBuf> {
        let rows: Vec<serde_json::Value> = resolution
            .rows
            .iter()
            .map(|row| {
                let cells: serde_json::Map<String, serde_json::Value> = template
                    .slots
                    .iter()
                    .map(|slot| {
                        let value = row
                            .values
                            .get(slot)
                            .and_then(|v| v.as_str())
                            .unwrap_or("");
                        (slot.clone(), serde_json::Value::String(value.to_string()))
                    })
                    .collect();
                serde_json::Value::Object(cells)
            })
            .collect();

        let sheet = serde_json::json!({
            "template": template.name,
            "columns": template.slots,
            "rows": rows,
        });

        let path = output_dir.join(format!("filled_{}_{stamp}.json", template.name));
        write_json_atomic(&path, &sheet)?;

        info!(
            path = %path.display(),
            rows = resolution.rows.len(),
            "filled sheet written"
        );

        Ok(path)
    }
}
