//! Data models for fields, controls, and configuration.

pub mod config;
pub mod field;

pub use config::FormScanConfig;
pub use field::{
    Choice, ChoiceValue, Control, DateKind, Field, FieldCondition, InputKind, InsuranceScope,
    Section,
};
