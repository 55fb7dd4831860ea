//! Field Resolver / Autofill Engine.
//!
//! Given flattened order records, a template descriptor, a static mapping,
//! a rule set, and a learning store, compute a value or an explicit unknown
//! marker for every template slot, persist newly learned resolutions, and
//! emit diagnostics for everything that could not be resolved.

pub mod learning;
pub mod mapping;
pub mod materializer;
pub mod resolver;
pub mod rules;
pub mod template;

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use orderdesk_shared::{OrderRecord, Result};

pub use learning::LearningStore;
pub use mapping::{AutofillPaths, MappingConfig, TemplateSources, ensure_initialized};
pub use materializer::{SheetWriter, TemplateMaterializer};
pub use resolver::{Resolution, ResolvedRow, SlotValue, resolve_records};
pub use rules::RuleSet;
pub use template::{TemplateDescriptor, load_template};

// ---------------------------------------------------------------------------
// Composite fill operation
// ---------------------------------------------------------------------------

/// Inputs for one [`fill_template`] call.
#[derive(Debug, Clone)]
pub struct FillRequest<'a> {
    /// Flattened records (identity populated on every record).
    pub records: &'a [OrderRecord],
    /// Template descriptor path.
    pub template_path: &'a Path,
    /// Directory the filled artifact is written into.
    pub output_dir: &'a Path,
    /// Rule-set file path.
    pub rules_path: &'a Path,
    /// Mapping configuration path.
    pub mapping_path: &'a Path,
    /// Where the diagnostics record is written.
    pub diagnostics_path: &'a Path,
    /// Learning-store directory.
    pub learning_dir: &'a Path,
    /// Run timestamp qualifying the artifact file name.
    pub stamp: &'a str,
}

/// Outcome of one fill.
#[derive(Debug)]
pub struct FillOutcome {
    /// Path of the filled artifact.
    pub artifact_path: PathBuf,
    /// Slots resolved across all records.
    pub resolved_count: usize,
    /// Slots that could not be resolved.
    pub diagnostics_count: usize,
}

/// Resolve all records against the template and materialize the filled
/// artifact, writing the diagnostics record as a side effect.
///
/// Learning-store mutations are persisted at end of resolve, before the
/// artifact is written. They remain in effect even if materialization
/// fails; resolution persistence is not transactional with the run.
#[instrument(skip_all, fields(records = request.records.len(), template = %request.template_path.display()))]
pub fn fill_template(
    request: &FillRequest<'_>,
    materializer: &dyn TemplateMaterializer,
) -> Result<FillOutcome> {
    let template = template::load_template(request.template_path)?;
    let mapping = mapping::load_mapping(request.mapping_path)?;
    let rules = rules::RuleSet::load(request.rules_path)?;
    let mut store = learning::LearningStore::open(request.learning_dir)?;

    let resolution = resolver::resolve_records(
        request.records,
        &template,
        &mapping,
        &rules,
        &mut store,
    );

    store.persist()?;

    orderdesk_artifacts::write_diagnostics(&resolution.diagnostics, request.diagnostics_path)?;

    let artifact_path =
        materializer.materialize(&resolution, &template, request.output_dir, request.stamp)?;

    info!(
        artifact = %artifact_path.display(),
        resolved = resolution.resolved_count,
        unresolved = resolution.diagnostics.len(),
        "template filled"
    );

    Ok(FillOutcome {
        artifact_path,
        resolved_count: resolution.resolved_count,
        diagnostics_count: resolution.diagnostics.len(),
    })
}
