//! Shared types, error model, and configuration for Orderdesk.
//!
//! This crate is the foundation depended on by all other Orderdesk crates.
//! It provides:
//! - [`OrderdeskError`] — the unified error type
//! - Domain types ([`Document`], [`OrderRecord`], [`Person`], [`Combined`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{AppConfig, InputConfig, PathsConfig, load_config, load_config_from};
pub use error::{OrderdeskError, Result};
pub use types::{
    Combined, Diagnostic, DiagnosticReason, DocFormat, Document, DocumentSummary,
    ExtractionBatch, OrderRecord, Person,
};
