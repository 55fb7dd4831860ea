//! Declarative transformation/validation rules for field classes.
//!
//! A rule file groups patterns by field class (e.g. identity-document
//! numbers): `valid` patterns define the canonical shapes a value may
//! already have, `transforms` rewrite near-miss inputs into canonical shape
//! via regex capture-group substitution. The rule set is a read-only input;
//! a missing file loads as the empty rule set so a fresh checkout still
//! runs.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use orderdesk_shared::{OrderdeskError, Result};

// ---------------------------------------------------------------------------
// File model
// ---------------------------------------------------------------------------

/// On-disk rule file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleSetFile {
    #[serde(default)]
    pub field_classes: Vec<FieldClassRules>,
}

/// Rules for one field class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldClassRules {
    /// Class name; also keys the learning-store file for this class.
    pub class: String,
    /// Template slots governed by this class.
    pub slots: Vec<String>,
    /// Canonical-shape patterns. A value matching any of these is accepted
    /// as-is.
    #[serde(default)]
    pub valid: Vec<String>,
    /// Rewrite rules, tried in order.
    #[serde(default)]
    pub transforms: Vec<TransformRule>,
}

/// One rewrite rule: `pattern` captures, `replace` substitutes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformRule {
    pub pattern: String,
    pub replace: String,
}

// ---------------------------------------------------------------------------
// Compiled form
// ---------------------------------------------------------------------------

/// A field class with its patterns compiled.
#[derive(Debug)]
pub struct CompiledClass {
    pub name: String,
    slots: Vec<String>,
    valid: Vec<Regex>,
    transforms: Vec<(Regex, String)>,
}

impl CompiledClass {
    /// Whether the raw value already has canonical shape.
    pub fn is_valid(&self, raw: &str) -> bool {
        self.valid.iter().any(|re| re.is_match(raw))
    }

    /// Try the rewrite rules in order; the first whose pattern matches and
    /// whose output has canonical shape wins.
    pub fn transform(&self, raw: &str) -> Option<String> {
        for (pattern, replace) in &self.transforms {
            if pattern.is_match(raw) {
                let rewritten = pattern.replace(raw, replace.as_str()).to_string();
                if self.is_valid(&rewritten) {
                    return Some(rewritten);
                }
                debug!(
                    class = %self.name,
                    raw,
                    rewritten,
                    "transform output failed validation, trying next rule"
                );
            }
        }
        None
    }
}

/// The compiled rule set for one run.
#[derive(Debug, Default)]
pub struct RuleSet {
    classes: Vec<CompiledClass>,
}

impl RuleSet {
    /// A rule set with no classes: every slot resolves verbatim.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and compile a rule file. A missing file yields the empty set;
    /// malformed JSON or an invalid pattern is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(?path, "rule file not found, resolving without rules");
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(path).map_err(|e| OrderdeskError::io(path, e))?;
        let file: RuleSetFile = serde_json::from_str(&content)
            .map_err(|e| OrderdeskError::parse(format!("invalid rules {}: {e}", path.display())))?;

        Self::compile(file)
    }

    /// Compile an in-memory rule file.
    pub fn compile(file: RuleSetFile) -> Result<Self> {
        let mut classes = Vec::with_capacity(file.field_classes.len());

        for class in file.field_classes {
            let valid = class
                .valid
                .iter()
                .map(|p| compile_pattern(&class.class, p))
                .collect::<Result<Vec<_>>>()?;
            let transforms = class
                .transforms
                .iter()
                .map(|t| Ok((compile_pattern(&class.class, &t.pattern)?, t.replace.clone())))
                .collect::<Result<Vec<_>>>()?;

            classes.push(CompiledClass {
                name: class.class,
                slots: class.slots,
                valid,
                transforms,
            });
        }

        Ok(Self { classes })
    }

    /// The class governing a slot, if any.
    pub fn class_for_slot(&self, slot: &str) -> Option<&CompiledClass> {
        self.classes
            .iter()
            .find(|c| c.slots.iter().any(|s| s == slot))
    }
}

fn compile_pattern(class: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        OrderdeskError::validation(format!("bad pattern {pattern:?} in class {class}: {e}"))
    })
}
