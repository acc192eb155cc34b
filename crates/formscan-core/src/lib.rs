//! Core library for intake-form digitization.
//!
//! This crate provides:
//! - Text normalization and structural scrubbing of OCR output
//! - A forward-scanning field classifier with pluggable recognizers
//! - Multi-column checkbox grid and header-row table detection
//! - Tiered template-catalog matching with fuzzy fallback
//! - Consolidation into a deterministic, schema-ready field sequence

pub mod catalog;
pub mod consolidate;
pub mod diagnostics;
pub mod error;
pub mod models;
pub mod scan;
pub mod text;

pub use catalog::{TemplateCatalog, TemplateEntry};
pub use catalog::matcher::{MatchOutcome, TemplateMatcher};
pub use diagnostics::{DocumentStats, EventLog, MatchReason, ParseEvent};
pub use error::{CatalogError, FormScanError, InputError, ParseError, Result};
pub use models::config::FormScanConfig;
pub use models::field::{
    Choice, ChoiceValue, Control, DateKind, Field, FieldCondition, InputKind, InsuranceScope,
    Section,
};
pub use scan::{FieldCandidate, FormParser, ParseOutcome};
