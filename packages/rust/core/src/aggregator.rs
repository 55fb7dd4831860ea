//! Combined-result aggregation.
//!
//! Merges per-document extraction results into one entry per distinct
//! person, each holding that person's records in document-discovery order.
//! Identity matching is exact-string only: two distinct people sharing a
//! display string merge into one Person. Known limitation; there is no
//! disambiguation beyond the identity string.

use std::collections::HashMap;

use tracing::{debug, instrument};

use orderdesk_shared::{Combined, ExtractionBatch, OrderRecord, Person};

/// Merge extraction batches into the combined result.
///
/// Batches are folded in input order (the locator's sort order). A record
/// missing its identity field is backfilled from the owning person before
/// it is appended, so no record leaves this function without an identity.
#[instrument(skip_all, fields(batches = batches.len()))]
pub fn aggregate(batches: &[ExtractionBatch]) -> Combined {
    let mut combined = Combined::default();
    let mut person_index: HashMap<String, usize> = HashMap::new();

    for batch in batches {
        combined.documents.extend(batch.documents.iter().cloned());

        for person in &batch.people {
            let idx = match person_index.get(&person.full_name) {
                Some(&idx) => idx,
                None => {
                    combined.people.push(Person::new(person.full_name.clone()));
                    person_index.insert(person.full_name.clone(), combined.people.len() - 1);
                    combined.people.len() - 1
                }
            };

            for record in &person.records {
                let mut record = record.clone();
                if record.full_name.is_empty() {
                    record.full_name = person.full_name.clone();
                }
                combined.people[idx].records.push(record);
            }
        }
    }

    debug!(
        documents = combined.documents.len(),
        people = combined.people.len(),
        records = combined.record_count(),
        "aggregation complete"
    );

    combined
}

/// Flatten the combined result into one record list, nesting removed and
/// the identity string populated on every record.
pub fn flatten(combined: &Combined) -> Vec<OrderRecord> {
    let mut records = Vec::with_capacity(combined.record_count());

    for person in &combined.people {
        for record in &person.records {
            let mut record = record.clone();
            if record.full_name.is_empty() {
                record.full_name = person.full_name.clone();
            }
            records.push(record);
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderdesk_shared::DocumentSummary;

    fn summary(path: &str, records: usize) -> DocumentSummary {
        DocumentSummary {
            source_path: path.into(),
            order_ref: Some("45-K".into()),
            record_count: records,
            content_hash: None,
        }
    }

    fn person_with_records(name: &str, count: usize) -> Person {
        let mut person = Person::new(name);
        for i in 0..count {
            let mut record = OrderRecord::default();
            record.full_name = name.to_string();
            record.doc_number = Some(format!("AB{:06}", i + 1));
            person.records.push(record);
        }
        person
    }

    fn batch(doc: &str, people: Vec<Person>) -> ExtractionBatch {
        let record_count = people.iter().map(|p| p.records.len()).sum();
        ExtractionBatch {
            documents: vec![summary(doc, record_count)],
            people,
        }
    }

    #[test]
    fn same_identity_across_documents_merges_into_one_person() {
        // Two documents for "Smith": 2 records then 1 record.
        let batches = vec![
            batch("a.txt", vec![person_with_records("Smith", 2)]),
            batch("b.txt", vec![person_with_records("Smith", 1)]),
        ];

        let combined = aggregate(&batches);

        assert_eq!(combined.people.len(), 1);
        let smith = &combined.people[0];
        assert_eq!(smith.full_name, "Smith");
        assert_eq!(smith.records.len(), 3);
        // Discovery order preserved: a.txt records first.
        assert_eq!(smith.records[0].doc_number.as_deref(), Some("AB000001"));
        assert_eq!(smith.records[2].doc_number.as_deref(), Some("AB000001"));
        assert_eq!(combined.documents.len(), 2);
    }

    #[test]
    fn record_counts_are_associative_across_batch_partitions() {
        let all = vec![
            batch("a.txt", vec![person_with_records("Smith", 2)]),
            batch("b.txt", vec![person_with_records("Ivanov", 1)]),
            batch("c.txt", vec![person_with_records("Smith", 1)]),
        ];

        let whole = aggregate(&all);
        let split_head = aggregate(&all[..1]);
        let split_tail = aggregate(&all[1..]);

        let input_total: usize = all
            .iter()
            .flat_map(|b| b.documents.iter())
            .map(|d| d.record_count)
            .sum();

        assert_eq!(whole.record_count(), input_total);
        assert_eq!(
            split_head.record_count() + split_tail.record_count(),
            input_total
        );
    }

    #[test]
    fn missing_identity_is_backfilled_before_append() {
        let mut person = Person::new("Smith");
        person.records.push(OrderRecord::default());

        let combined = aggregate(&[batch("a.txt", vec![person])]);

        assert_eq!(combined.people[0].records[0].full_name, "Smith");
    }

    #[test]
    fn aggregation_is_idempotent() {
        let mut person = Person::new("Smith");
        person.records.push(OrderRecord::default());
        let batches = vec![batch("a.txt", vec![person])];

        let first = aggregate(&batches);
        let second = aggregate(&batches);

        assert_eq!(first, second);
    }

    #[test]
    fn flatten_removes_nesting_and_keeps_identities() {
        let batches = vec![
            batch("a.txt", vec![person_with_records("Smith", 2)]),
            batch("b.txt", vec![person_with_records("Ivanov", 1)]),
        ];
        let combined = aggregate(&batches);

        let records = flatten(&combined);

        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| !r.full_name.is_empty()));
        assert_eq!(records[0].full_name, "Smith");
        assert_eq!(records[2].full_name, "Ivanov");
    }
}
