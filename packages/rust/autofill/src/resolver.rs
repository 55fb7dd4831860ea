//! Field resolution engine.
//!
//! For every (record, slot) pair the resolver produces either a value or an
//! explicit unknown marker plus a diagnostic, never silence. Resolution
//! order per slot: static mapping, rule-set validation/transformation,
//! learning-store lookup, unknown.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use orderdesk_shared::{Diagnostic, DiagnosticReason, OrderRecord};

use crate::learning::LearningStore;
use crate::mapping::MappingConfig;
use crate::rules::RuleSet;
use crate::template::TemplateDescriptor;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Value assigned to one template slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    /// A confidently resolved value.
    Resolved(String),
    /// Explicit unknown marker; a matching diagnostic entry exists.
    Unknown,
}

impl SlotValue {
    /// The resolved value, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Resolved(v) => Some(v.as_str()),
            Self::Unknown => None,
        }
    }
}

/// Slot assignments for one record.
#[derive(Debug, Clone)]
pub struct ResolvedRow {
    /// Identity of the record the row was built from.
    pub identity: String,
    /// slot name → assignment. Every template slot is present.
    pub values: BTreeMap<String, SlotValue>,
}

/// Complete resolver output for one run.
///
/// Invariant: `resolved_count + diagnostics.len()` equals slots × records.
#[derive(Debug, Default)]
pub struct Resolution {
    pub rows: Vec<ResolvedRow>,
    pub diagnostics: Vec<Diagnostic>,
    pub resolved_count: usize,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve every template slot for every flattened record.
///
/// Side effect: transformations that rewrote a raw input are recorded in
/// the learning store (in memory; the caller persists at end of resolve).
#[instrument(skip_all, fields(records = records.len(), slots = template.slots.len()))]
pub fn resolve_records(
    records: &[OrderRecord],
    template: &TemplateDescriptor,
    mapping: &MappingConfig,
    rules: &RuleSet,
    store: &mut LearningStore,
) -> Resolution {
    let mut resolution = Resolution::default();

    for record in records {
        let mut values = BTreeMap::new();

        for slot in &template.slots {
            match resolve_slot(record, slot, mapping, rules, store) {
                Ok(value) => {
                    resolution.resolved_count += 1;
                    values.insert(slot.clone(), SlotValue::Resolved(value));
                }
                Err(reason) => {
                    resolution.diagnostics.push(Diagnostic {
                        record: record.full_name.clone(),
                        slot: slot.clone(),
                        reason,
                    });
                    values.insert(slot.clone(), SlotValue::Unknown);
                }
            }
        }

        resolution.rows.push(ResolvedRow {
            identity: record.full_name.clone(),
            values,
        });
    }

    debug!(
        resolved = resolution.resolved_count,
        unresolved = resolution.diagnostics.len(),
        "resolution complete"
    );

    resolution
}

/// Resolve one slot for one record.
fn resolve_slot(
    record: &OrderRecord,
    slot: &str,
    mapping: &MappingConfig,
    rules: &RuleSet,
    store: &mut LearningStore,
) -> std::result::Result<String, DiagnosticReason> {
    // 1. Static mapping selects the source field.
    let source = mapping.source_field(slot);
    let raw = record
        .field(source)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(DiagnosticReason::MissingSource)?;

    let Some(class) = rules.class_for_slot(slot) else {
        // No governing field class: the mapped value stands as-is.
        return Ok(raw.to_string());
    };

    // 2. Rule set: canonical values pass, near-misses are rewritten. A
    // rewrite is a disambiguation worth remembering.
    if class.is_valid(raw) {
        return Ok(raw.to_string());
    }
    if let Some(rewritten) = class.transform(raw) {
        return Ok(store.learn(&class.name, raw, &rewritten));
    }

    // 3. Previously confirmed resolution.
    if let Some(known) = store.lookup(&class.name, raw) {
        return Ok(known.to_string());
    }

    // 4. Out of options.
    Err(DiagnosticReason::Unresolved)
}
