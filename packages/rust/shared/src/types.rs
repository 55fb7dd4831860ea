//! Core domain types for the order aggregation and autofill pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Format marker for an input document, derived from its file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocFormat {
    /// A word-processing document (`.docx`).
    Docx,
    /// A plain-text order document.
    Text,
}

impl DocFormat {
    /// Derive the format marker from a lowercased file extension.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "docx" => Self::Docx,
            _ => Self::Text,
        }
    }
}

impl std::fmt::Display for DocFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Docx => write!(f, "docx"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A single input document reference. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path to the document on disk.
    pub path: PathBuf,
    /// Format marker derived from the extension.
    pub format: DocFormat,
}

// ---------------------------------------------------------------------------
// OrderRecord
// ---------------------------------------------------------------------------

/// One order entry belonging to a person.
///
/// The fields the resolver inspects are typed; everything else an extractor
/// surfaces lands in the `extra` bucket so no field is lost to forward
/// compatibility. After aggregation `full_name` is always populated
/// (backfilled from the owning [`Person`] when the extractor omitted it).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Identity string of the person this record belongs to.
    #[serde(default)]
    pub full_name: String,
    /// Reference of the order that produced this record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    /// Date of the order, as written in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    /// Identity-document number, as written in the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_number: Option<String>,
    /// Fields the extractor surfaced that have no typed slot here.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl OrderRecord {
    /// Look up a field value by source-field name.
    ///
    /// Typed fields are checked first, then the `extra` bucket. Empty
    /// strings count as absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "full_name" => Some(self.full_name.as_str()),
            "order_ref" => self.order_ref.as_deref(),
            "order_date" => self.order_date.as_deref(),
            "doc_number" => self.doc_number.as_deref(),
            _ => self.extra.get(name).map(String::as_str),
        };
        value.filter(|v| !v.is_empty())
    }

    /// Set a field by source-field name, routing unknown names to `extra`.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            "full_name" => self.full_name = value,
            "order_ref" => self.order_ref = Some(value),
            "order_date" => self.order_date = Some(value),
            "doc_number" => self.doc_number = Some(value),
            _ => {
                self.extra.insert(name.to_string(), value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// Aggregation unit: one distinct identity string and the ordered list of
/// records extracted for it. Owns its records exclusively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Identity string (exact-match grouping key).
    pub full_name: String,
    /// Records in document-discovery order.
    #[serde(default)]
    pub records: Vec<OrderRecord>,
}

impl Person {
    /// Create an empty person entry for the given identity.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            records: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction output
// ---------------------------------------------------------------------------

/// Per-document processing summary carried into the combined export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Source document path.
    pub source_path: String,
    /// Order reference found in the document, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_ref: Option<String>,
    /// Number of records extracted from this document.
    pub record_count: usize,
    /// SHA-256 of the document bytes, for traceability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
}

/// Output contract of the Order Extractor collaborator: processed-document
/// summaries plus person entries with nested records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionBatch {
    /// One summary per processed document, in input order.
    pub documents: Vec<DocumentSummary>,
    /// Person entries in first-seen order.
    pub people: Vec<Person>,
}

// ---------------------------------------------------------------------------
// Combined
// ---------------------------------------------------------------------------

/// Top-level aggregate: all processed documents and all persons.
///
/// Invariant: the union of all persons' records equals the union of all
/// documents' extracted records; nothing is silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combined {
    /// Document summaries in discovery order.
    pub documents: Vec<DocumentSummary>,
    /// Persons in first-seen order.
    pub people: Vec<Person>,
}

impl Combined {
    /// Total number of records across all persons.
    pub fn record_count(&self) -> usize {
        self.people.iter().map(|p| p.records.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a template slot could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticReason {
    /// The mapped source field is absent or empty on the record.
    MissingSource,
    /// A raw value was present but no rule, transformation, or learned
    /// resolution covered it.
    Unresolved,
}

/// One unresolved slot, recorded fresh each run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Identity of the record the slot belongs to.
    pub record: String,
    /// Template slot name.
    pub slot: String,
    /// Reason code.
    pub reason: DiagnosticReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_format_from_extension() {
        assert_eq!(DocFormat::from_extension("docx"), DocFormat::Docx);
        assert_eq!(DocFormat::from_extension("txt"), DocFormat::Text);
    }

    #[test]
    fn record_field_lookup_checks_typed_then_extra() {
        let mut record = OrderRecord::default();
        record.set_field("full_name", "Smith A.");
        record.set_field("doc_number", "AB 123456");
        record.set_field("position", "driver");

        assert_eq!(record.field("full_name"), Some("Smith A."));
        assert_eq!(record.field("doc_number"), Some("AB 123456"));
        assert_eq!(record.field("position"), Some("driver"));
        assert_eq!(record.field("rank"), None);
        assert_eq!(record.extra.len(), 1);
    }

    #[test]
    fn record_field_empty_counts_as_absent() {
        let mut record = OrderRecord::default();
        record.set_field("order_ref", "");
        assert_eq!(record.field("order_ref"), None);
        assert_eq!(record.field("full_name"), None);
    }

    #[test]
    fn combined_serialization_roundtrip() {
        let combined = Combined {
            documents: vec![DocumentSummary {
                source_path: "input/order.docx".into(),
                order_ref: Some("45-K".into()),
                record_count: 2,
                content_hash: Some("abc123".into()),
            }],
            people: vec![Person {
                full_name: "Smith A.".into(),
                records: vec![OrderRecord {
                    full_name: "Smith A.".into(),
                    order_ref: Some("45-K".into()),
                    ..Default::default()
                }],
            }],
        };

        let json = serde_json::to_string_pretty(&combined).expect("serialize");
        let parsed: Combined = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.documents.len(), 1);
        assert_eq!(parsed.record_count(), 1);
        assert_eq!(parsed.people[0].full_name, "Smith A.");
    }

    #[test]
    fn diagnostic_reason_serializes_snake_case() {
        let diag = Diagnostic {
            record: "Smith A.".into(),
            slot: "doc_number".into(),
            reason: DiagnosticReason::Unresolved,
        };
        let json = serde_json::to_string(&diag).expect("serialize");
        assert!(json.contains("\"unresolved\""));

        let json = serde_json::to_string(&DiagnosticReason::MissingSource).expect("serialize");
        assert_eq!(json, "\"missing_source\"");
    }
}
