//! Tagged-text order document parser.
//!
//! Parses the keyed line format order documents are exported in:
//! - Header lines: `order: <reference>`, `date: <date>`
//! - `person: <full name>` opens a new record for that person
//! - `<key>: <value>` lines populate the open record; known keys map to the
//!   typed record fields, everything else lands in the `extra` bucket
//! - Lines that match nothing are skipped without error

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use orderdesk_shared::{OrderRecord, Person};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Parsed representation of one order document.
#[derive(Debug, Clone, Default)]
pub struct ParsedOrder {
    /// Document-level order reference (first `order:` header line).
    pub order_ref: Option<String>,
    /// Document-level order date (first `date:` header line).
    pub order_date: Option<String>,
    /// Person entries in first-seen order, one record per `person:` line.
    pub people: Vec<Person>,
}

impl ParsedOrder {
    /// Total records across all person entries.
    pub fn record_count(&self) -> usize {
        self.people.iter().map(|p| p.records.len()).sum()
    }
}

// ---------------------------------------------------------------------------
// Regex patterns (compiled once)
// ---------------------------------------------------------------------------

/// Matches `key: value` with a word-like key.
static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_ ]*?)\s*:\s*(.+)$").expect("field regex"));

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse the text content of one order document.
///
/// Never fails: a document with no `person:` lines yields an empty
/// [`ParsedOrder`], and unparseable lines are ignored.
pub fn parse_order_text(content: &str) -> ParsedOrder {
    let mut parsed = ParsedOrder::default();
    let mut person_index: HashMap<String, usize> = HashMap::new();
    // (person index, record index) of the record currently being populated.
    let mut open_record: Option<(usize, usize)> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(caps) = FIELD_RE.captures(trimmed) else {
            continue;
        };
        let key = normalize_key(&caps[1]);
        let value = caps[2].trim();
        if value.is_empty() {
            continue;
        }

        if key == "person" {
            let idx = match person_index.get(value) {
                Some(&idx) => idx,
                None => {
                    parsed.people.push(Person::new(value));
                    person_index.insert(value.to_string(), parsed.people.len() - 1);
                    parsed.people.len() - 1
                }
            };
            let mut record = OrderRecord::default();
            record.full_name = value.to_string();
            parsed.people[idx].records.push(record);
            open_record = Some((idx, parsed.people[idx].records.len() - 1));
            continue;
        }

        match open_record {
            Some((p, r)) => {
                parsed.people[p].records[r].set_field(&field_alias(&key), value);
            }
            None => match key.as_str() {
                "order" | "order_ref" if parsed.order_ref.is_none() => {
                    parsed.order_ref = Some(value.to_string());
                }
                "date" | "order_date" if parsed.order_date.is_none() => {
                    parsed.order_date = Some(value.to_string());
                }
                // Other header lines carry no record data.
                _ => {}
            },
        }
    }

    parsed
}

/// Lowercase a key and join interior whitespace with underscores.
fn normalize_key(key: &str) -> String {
    key.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Map document key spellings onto record field names.
fn field_alias(key: &str) -> String {
    match key {
        "order" => "order_ref".to_string(),
        "date" => "order_date".to_string(),
        _ => key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
order: 45-K
date: 2025-03-01

person: Smith A. I.
doc_number: AB 123456
position: driver

person: Ivanov B.
doc_number: 123456789
";

    #[test]
    fn parse_sample_document() {
        let parsed = parse_order_text(SAMPLE);

        assert_eq!(parsed.order_ref.as_deref(), Some("45-K"));
        assert_eq!(parsed.order_date.as_deref(), Some("2025-03-01"));
        assert_eq!(parsed.people.len(), 2);
        assert_eq!(parsed.record_count(), 2);

        let smith = &parsed.people[0];
        assert_eq!(smith.full_name, "Smith A. I.");
        assert_eq!(smith.records[0].field("doc_number"), Some("AB 123456"));
        assert_eq!(smith.records[0].field("position"), Some("driver"));
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let parsed = parse_order_text("person: Smith\nrank: sergeant\nunit: 3rd\n");
        let record = &parsed.people[0].records[0];
        assert_eq!(record.extra.get("rank").map(String::as_str), Some("sergeant"));
        assert_eq!(record.extra.get("unit").map(String::as_str), Some("3rd"));
    }

    #[test]
    fn repeated_person_merges_into_one_entry() {
        let content = "person: Smith\ndoc_number: AB 111111\nperson: Smith\ndoc_number: AB 222222\n";
        let parsed = parse_order_text(content);

        assert_eq!(parsed.people.len(), 1);
        assert_eq!(parsed.people[0].records.len(), 2);
        assert_eq!(
            parsed.people[0].records[1].field("doc_number"),
            Some("AB 222222")
        );
    }

    #[test]
    fn record_level_order_overrides_header_alias() {
        let content = "order: 45-K\nperson: Smith\norder: 46-K\n";
        let parsed = parse_order_text(content);

        assert_eq!(parsed.order_ref.as_deref(), Some("45-K"));
        assert_eq!(
            parsed.people[0].records[0].field("order_ref"),
            Some("46-K")
        );
    }

    #[test]
    fn junk_lines_are_skipped() {
        let content = "ORDER DOCUMENT\n====\nperson: Smith\n- bullet noise\ndoc_number: AB 123456\n";
        let parsed = parse_order_text(content);

        assert_eq!(parsed.people.len(), 1);
        assert_eq!(
            parsed.people[0].records[0].field("doc_number"),
            Some("AB 123456")
        );
    }

    #[test]
    fn document_without_people_is_empty_not_an_error() {
        let parsed = parse_order_text("order: 45-K\nsome prose paragraph\n");
        assert_eq!(parsed.order_ref.as_deref(), Some("45-K"));
        assert!(parsed.people.is_empty());
        assert_eq!(parsed.record_count(), 0);
    }

    #[test]
    fn key_normalization() {
        assert_eq!(normalize_key("Doc Number"), "doc_number");
        assert_eq!(normalize_key("  ORDER "), "order");
        assert_eq!(field_alias("date"), "order_date");
        assert_eq!(field_alias("doc_number"), "doc_number");
    }
}
