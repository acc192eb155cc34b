//! Mutable parse state threaded through the scan.

use tracing::debug;

use crate::diagnostics::{EventLog, ParseEvent};
use crate::models::config::FormScanConfig;
use crate::models::field::{InsuranceScope, Section};

/// Per-document parse context.
///
/// Owned by the classifier loop and passed by mutable reference to each
/// recognizer; nothing here is global.
#[derive(Debug)]
pub struct ParseContext<'a> {
    /// Pipeline configuration.
    pub config: &'a FormScanConfig,

    /// Current section.
    pub section: Section,

    /// Current insurance scope, reset on every section change.
    pub scope: InsuranceScope,

    /// Whether a signature field has already been emitted.
    pub signature_emitted: bool,

    /// Diagnostics collected during the scan.
    pub events: EventLog,

    anon_counter: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(config: &'a FormScanConfig) -> Self {
        Self {
            config,
            section: Section::General,
            scope: InsuranceScope::None,
            signature_emitted: false,
            events: EventLog::new(),
            anon_counter: 0,
        }
    }

    /// Move to a new section, resetting the insurance scope.
    ///
    /// Entering the insurance section defaults the scope to primary; a
    /// dedicated secondary anchor overrides it afterwards.
    pub fn enter_section(&mut self, section: Section, line: usize) {
        if section == self.section {
            return;
        }
        debug!(line, %section, "section change");
        self.section = section;
        self.scope = if section == Section::Insurance {
            InsuranceScope::Primary
        } else {
            InsuranceScope::None
        };
        self.events.push(ParseEvent::SectionChange { line, section });
    }

    /// Apply the active insurance scope suffix to a base key.
    pub fn scoped_key(&self, base: &str) -> String {
        self.scope.apply(base)
    }

    /// Key for a field whose title yields an empty slug.
    pub fn anonymous_key(&mut self) -> String {
        self.anon_counter += 1;
        format!("field_{}", self.anon_counter)
    }
}
