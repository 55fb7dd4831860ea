//! Order Extractor collaborator.
//!
//! The pipeline core depends only on the [`OrderExtractor`] output contract:
//! given a batch of discovered documents, produce processed-document
//! summaries plus person entries with nested order records. The bundled
//! [`TaggedTextExtractor`] reads the tagged-text export format; extractors
//! for binary word-processing formats plug in behind the same trait.

mod parser;

use std::collections::HashMap;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, instrument, warn};

use orderdesk_shared::{Document, DocumentSummary, ExtractionBatch, Person, Result};

pub use parser::{ParsedOrder, parse_order_text};

/// Order-reference marker recorded for documents that were skipped because
/// they could not be read or decoded.
pub const UNREADABLE_MARKER: &str = "<unreadable>";

// ---------------------------------------------------------------------------
// Collaborator contract
// ---------------------------------------------------------------------------

/// Extracts order records from a batch of documents.
///
/// The template path and learning-store directory are part of the call
/// contract so context-aware extractors can consult them; implementations
/// are free to ignore either.
pub trait OrderExtractor {
    /// Extract all documents in one batched call, in input order.
    fn extract(
        &self,
        documents: &[Document],
        template_path: &Path,
        learning_dir: &Path,
    ) -> Result<ExtractionBatch>;
}

// ---------------------------------------------------------------------------
// Bundled tagged-text extractor
// ---------------------------------------------------------------------------

/// Extractor for the tagged-text order format.
///
/// Failure policy: a document that cannot be read or is not valid UTF-8 is
/// skipped (logged at WARN, recorded as a zero-record summary with the
/// [`UNREADABLE_MARKER`] order reference) and the batch continues. The
/// template and learning-store inputs are accepted per the collaborator
/// contract but not consulted.
#[derive(Debug, Default)]
pub struct TaggedTextExtractor;

impl TaggedTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl OrderExtractor for TaggedTextExtractor {
    #[instrument(skip_all, fields(documents = documents.len()))]
    fn extract(
        &self,
        documents: &[Document],
        _template_path: &Path,
        _learning_dir: &Path,
    ) -> Result<ExtractionBatch> {
        let mut batch = ExtractionBatch::default();
        let mut person_index: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let source_path = doc.path.display().to_string();

            let bytes = match std::fs::read(&doc.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %source_path, error = %e, "skipping unreadable document");
                    batch.documents.push(DocumentSummary {
                        source_path,
                        order_ref: Some(UNREADABLE_MARKER.to_string()),
                        record_count: 0,
                        content_hash: None,
                    });
                    continue;
                }
            };

            let content_hash = {
                let mut hasher = Sha256::new();
                hasher.update(&bytes);
                format!("{:x}", hasher.finalize())
            };

            let text = match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!(path = %source_path, format = %doc.format, "skipping undecodable document");
                    batch.documents.push(DocumentSummary {
                        source_path,
                        order_ref: Some(UNREADABLE_MARKER.to_string()),
                        record_count: 0,
                        content_hash: Some(content_hash),
                    });
                    continue;
                }
            };

            let parsed = parse_order_text(&text);
            let record_count = parsed.record_count();

            debug!(
                path = %source_path,
                order_ref = parsed.order_ref.as_deref().unwrap_or("-"),
                records = record_count,
                "document extracted"
            );

            merge_people(&mut batch.people, &mut person_index, parsed.clone());

            batch.documents.push(DocumentSummary {
                source_path,
                order_ref: parsed.order_ref,
                record_count,
                content_hash: Some(content_hash),
            });
        }

        Ok(batch)
    }
}

/// Fold one parsed document into the batch's person list, preserving
/// first-seen person order and backfilling document-level context onto
/// records that lack their own.
fn merge_people(
    people: &mut Vec<Person>,
    person_index: &mut HashMap<String, usize>,
    parsed: ParsedOrder,
) {
    for person in parsed.people {
        let idx = match person_index.get(&person.full_name) {
            Some(&idx) => idx,
            None => {
                people.push(Person::new(person.full_name.clone()));
                person_index.insert(person.full_name.clone(), people.len() - 1);
                people.len() - 1
            }
        };

        for mut record in person.records {
            if record.order_ref.is_none() {
                record.order_ref = parsed.order_ref.clone();
            }
            if record.order_date.is_none() {
                record.order_date = parsed.order_date.clone();
            }
            people[idx].records.push(record);
        }
    }
}
