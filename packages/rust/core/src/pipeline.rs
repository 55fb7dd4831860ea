//! End-to-end run pipeline.
//!
//! One run walks `Discover → Extract → Aggregate → Flatten → Resolve →
//! {Export, Materialize}` strictly in order, with no backtracking. A
//! failure at any stage aborts the run; resolutions already persisted to
//! the learning store during Resolve remain in effect (persistence is not
//! transactional with the run). Resolve and Materialize only happen when
//! the filled artifact was requested.

use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, instrument};

use orderdesk_artifacts::{OutputLayout, export_combined, export_summary, run_stamp};
use orderdesk_autofill::{AutofillPaths, FillRequest, TemplateMaterializer, fill_template};
use orderdesk_extract::OrderExtractor;
use orderdesk_locator::collect_documents;
use orderdesk_shared::Result;

use crate::aggregator::{aggregate, flatten};

// ---------------------------------------------------------------------------
// Run configuration & result
// ---------------------------------------------------------------------------

/// Which outputs a run produces. All three are independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputSelection {
    /// Combined structured export.
    pub json: bool,
    /// Plain-text summary.
    pub txt: bool,
    /// Filled template artifact (plus diagnostics).
    pub sheet: bool,
}

impl OutputSelection {
    /// Whether anything at all was requested.
    pub fn any(&self) -> bool {
        self.json || self.txt || self.sheet
    }
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Input document file or directory.
    pub input: PathBuf,
    /// Template descriptor path.
    pub template_path: PathBuf,
    /// Output root directory.
    pub output_root: PathBuf,
    /// Eligible input file extensions.
    pub extensions: Vec<String>,
    /// Selected outputs.
    pub outputs: OutputSelection,
    /// Resolved autofill configuration handles (from the startup
    /// ensure-initialized bootstrap).
    pub autofill: AutofillPaths,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct RunResult {
    /// Documents processed.
    pub document_count: usize,
    /// Distinct persons in the combined result.
    pub person_count: usize,
    /// Total records across all persons.
    pub record_count: usize,
    /// Paths of every artifact written, in write order.
    pub artifacts: Vec<PathBuf>,
    /// Unresolved slots, when the filled artifact was produced.
    pub diagnostics_count: Option<usize>,
    /// Run timestamp qualifying all artifact names.
    pub stamp: String,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &RunResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &RunResult) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline.
#[instrument(skip_all, fields(input = %config.input.display()))]
pub fn run(
    config: &RunConfig,
    extractor: &dyn OrderExtractor,
    materializer: &dyn TemplateMaterializer,
    progress: &dyn ProgressReporter,
) -> Result<RunResult> {
    let start = Instant::now();

    // --- Discover ---
    progress.phase("Discovering documents");
    let documents = collect_documents(&config.input, &config.extensions)?;
    info!(count = documents.len(), "documents discovered");

    // A missing template must abort before any extraction happens.
    orderdesk_autofill::load_template(&config.template_path)?;

    // --- Extract ---
    progress.phase("Extracting orders");
    let batch = extractor.extract(
        &documents,
        &config.template_path,
        &config.autofill.learning_dir,
    )?;

    // --- Aggregate & flatten ---
    progress.phase("Aggregating records");
    let combined = aggregate(std::slice::from_ref(&batch));
    let records = flatten(&combined);

    let stamp = run_stamp();
    let layout = OutputLayout::create(&config.output_root)?;

    let mut artifacts = Vec::new();
    let mut diagnostics_count = None;

    // --- Export ---
    if config.outputs.json {
        progress.phase("Writing combined export");
        let path = layout.combined_path(&stamp);
        export_combined(&combined, &path)?;
        artifacts.push(path);
    }

    if config.outputs.txt {
        progress.phase("Writing summary");
        let path = layout.summary_path(&stamp);
        export_summary(&combined, &path)?;
        artifacts.push(path);
    }

    // --- Resolve & materialize ---
    if config.outputs.sheet {
        progress.phase("Filling template");
        let diagnostics_path = layout.diagnostics_path(&stamp);
        let outcome = fill_template(
            &FillRequest {
                records: &records,
                template_path: &config.template_path,
                output_dir: &layout.sheets_dir,
                rules_path: &config.autofill.rules_path,
                mapping_path: &config.autofill.mapping_path,
                diagnostics_path: &diagnostics_path,
                learning_dir: &config.autofill.learning_dir,
                stamp: &stamp,
            },
            materializer,
        )?;
        diagnostics_count = Some(outcome.diagnostics_count);
        artifacts.push(outcome.artifact_path);
        artifacts.push(diagnostics_path);
    }

    let result = RunResult {
        document_count: combined.documents.len(),
        person_count: combined.people.len(),
        record_count: combined.record_count(),
        artifacts,
        diagnostics_count,
        stamp,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        documents = result.document_count,
        people = result.person_count,
        records = result.record_count,
        artifacts = result.artifacts.len(),
        elapsed_ms = result.elapsed.as_millis(),
        "run complete"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_autofill::{SheetWriter, ensure_initialized};
    use orderdesk_extract::TaggedTextExtractor;
    use orderdesk_shared::OrderdeskError;
    use std::path::Path;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "orderdesk-pipeline-{tag}-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn setup(tmp: &Path, outputs: OutputSelection) -> RunConfig {
        let input_dir = tmp.join("input");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::write(
            input_dir.join("a.txt"),
            "order: 45-K\nperson: Smith\ndoc_number: AB 123456\nperson: Ivanov\ndoc_number: ??\n",
        )
        .unwrap();
        std::fs::write(
            input_dir.join("b.txt"),
            "order: 46-K\nperson: Smith\ndoc_number: AB-123456\n",
        )
        .unwrap();

        let template_path = tmp.join("standard.json");
        std::fs::write(
            &template_path,
            r#"{"name": "standard", "slots": ["full_name", "doc_number"]}"#,
        )
        .unwrap();

        let autofill = ensure_initialized(&tmp.join("config")).unwrap();
        std::fs::write(
            &autofill.rules_path,
            r#"{"field_classes": [{"class": "doc_number", "slots": ["doc_number"],
                "valid": ["^[A-Z]{2}\\d{6}$"],
                "transforms": [{"pattern": "^([A-Z]{2})[\\s-]+(\\d{6})$", "replace": "${1}${2}"}]}]}"#,
        )
        .unwrap();

        RunConfig {
            input: input_dir,
            template_path,
            output_root: tmp.join("output"),
            extensions: vec!["docx".into(), "txt".into()],
            outputs,
            autofill,
        }
    }

    fn count_files(root: &Path) -> usize {
        let mut count = 0;
        for entry in std::fs::read_dir(root).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                count += count_files(&path);
            } else {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn txt_only_run_writes_one_file_and_never_learns() {
        let tmp = temp_dir("txtonly");
        let config = setup(
            &tmp,
            OutputSelection {
                txt: true,
                ..Default::default()
            },
        );

        let result = run(
            &config,
            &TaggedTextExtractor::new(),
            &SheetWriter::new(),
            &SilentProgress,
        )
        .unwrap();

        assert_eq!(result.artifacts.len(), 1);
        assert_eq!(count_files(&config.output_root), 1);
        assert!(result.diagnostics_count.is_none());

        // The learning store was never touched.
        assert_eq!(
            std::fs::read_dir(&config.autofill.learning_dir).unwrap().count(),
            0
        );

        let summary = std::fs::read_to_string(&result.artifacts[0]).unwrap();
        assert!(summary.starts_with("DOCUMENTS: 2"));
        assert!(summary.contains("PEOPLE: 2"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn full_run_produces_all_artifacts() {
        let tmp = temp_dir("full");
        let config = setup(
            &tmp,
            OutputSelection {
                json: true,
                txt: true,
                sheet: true,
            },
        );

        let result = run(
            &config,
            &TaggedTextExtractor::new(),
            &SheetWriter::new(),
            &SilentProgress,
        )
        .unwrap();

        // combined + summary + filled sheet + diagnostics
        assert_eq!(result.artifacts.len(), 4);
        assert_eq!(result.document_count, 2);
        assert_eq!(result.person_count, 2);
        assert_eq!(result.record_count, 3);
        // Ivanov's "??" is the one unresolved slot.
        assert_eq!(result.diagnostics_count, Some(1));

        // The Smith transformation got persisted.
        let learned = std::fs::read_to_string(
            config.autofill.learning_dir.join("doc_number.json"),
        )
        .unwrap();
        assert!(learned.contains("AB123456"));

        // Combined export honors the record-count invariant.
        let combined: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&result.artifacts[0]).unwrap())
                .unwrap();
        let per_doc: u64 = combined["documents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["record_count"].as_u64().unwrap())
            .sum();
        assert_eq!(per_doc, 3);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bad_input_path_is_input_not_found() {
        let tmp = temp_dir("badinput");
        let mut config = setup(&tmp, OutputSelection::default());
        config.input = tmp.join("no-such-dir");

        let err = run(
            &config,
            &TaggedTextExtractor::new(),
            &SheetWriter::new(),
            &SilentProgress,
        )
        .unwrap_err();

        assert!(matches!(err, OrderdeskError::InputNotFound { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_template_aborts_before_extraction() {
        let tmp = temp_dir("notemplate");
        let mut config = setup(&tmp, OutputSelection::default());
        config.template_path = tmp.join("absent.json");

        let err = run(
            &config,
            &TaggedTextExtractor::new(),
            &SheetWriter::new(),
            &SilentProgress,
        )
        .unwrap_err();

        assert!(matches!(err, OrderdeskError::TemplateNotFound { .. }));
        // Nothing was written.
        assert!(!config.output_root.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
