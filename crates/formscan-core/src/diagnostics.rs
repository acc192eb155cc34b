//! Structured diagnostics collected during a parse.
//!
//! Tests and callers consume these events directly instead of parsing log
//! output. Events are appended in scan order, so the log is deterministic
//! for a given input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::field::{Field, Section};

/// Why a template entry matched a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    KeyExact,
    KeyBase,
    TitleExact,
    AliasExact,
    AliasContains,
    Fuzzy,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::KeyExact => "key_exact",
            MatchReason::KeyBase => "key_base",
            MatchReason::TitleExact => "title_exact",
            MatchReason::AliasExact => "alias_exact",
            MatchReason::AliasContains => "alias_contains",
            MatchReason::Fuzzy => "fuzzy",
        }
    }
}

/// One diagnostic event from the scan or the matcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ParseEvent {
    /// The section tracker moved to a new section.
    SectionChange { line: usize, section: Section },

    /// A candidate matched a template entry.
    TemplateMatch {
        title: String,
        key: String,
        reason: MatchReason,
        score: f32,
    },

    /// A fuzzy score landed above the logging floor but below acceptance.
    NearMiss {
        title: String,
        key: String,
        score: f32,
    },

    /// Fuzzy matching was skipped for a candidate.
    FuzzyGate { title: String, reason: String },

    /// A grid or table was accepted.
    GridAccepted {
        line: usize,
        rows: usize,
        columns: usize,
    },

    /// Candidate grid lines fell through to the generic classifier.
    GridRejected { line: usize, reason: String },
}

/// Append-only event collector owned by the parse context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<ParseEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ParseEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ParseEvent] {
        &self.events
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// All near-miss events, in scan order.
    pub fn near_misses(&self) -> impl Iterator<Item = &ParseEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, ParseEvent::NearMiss { .. }))
    }

    /// All template-match events, in scan order.
    pub fn matches(&self) -> impl Iterator<Item = &ParseEvent> {
        self.events
            .iter()
            .filter(|e| matches!(e, ParseEvent::TemplateMatch { .. }))
    }
}

/// Per-document statistics for the diagnostics side-channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Total output fields.
    pub total_fields: usize,

    /// Fields that adopted a template entry.
    pub matched_fields: usize,

    /// Matched-vs-total ratio.
    pub match_ratio: f32,

    /// Field counts by section display name.
    pub by_section: BTreeMap<String, usize>,

    /// Field counts by control type tag.
    pub by_type: BTreeMap<String, usize>,

    /// Near misses logged by the fuzzy matcher.
    pub near_misses: Vec<NearMissRecord>,
}

/// One near miss, flattened for the stats report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearMissRecord {
    pub title: String,
    pub key: String,
    pub score: f32,
}

impl DocumentStats {
    /// Build stats from the final field list and the event log.
    pub fn collect(fields: &[Field], events: &EventLog) -> Self {
        let mut by_section = BTreeMap::new();
        let mut by_type = BTreeMap::new();

        for field in fields {
            *by_section.entry(field.section.name().to_string()).or_insert(0) += 1;
            *by_type
                .entry(field.control.type_name().to_string())
                .or_insert(0) += 1;
        }

        let matched_fields = events.matches().count();
        let total_fields = fields.len();
        let match_ratio = if total_fields == 0 {
            0.0
        } else {
            matched_fields as f32 / total_fields as f32
        };

        let near_misses = events
            .near_misses()
            .filter_map(|e| match e {
                ParseEvent::NearMiss { title, key, score } => Some(NearMissRecord {
                    title: title.clone(),
                    key: key.clone(),
                    score: *score,
                }),
                _ => None,
            })
            .collect();

        Self {
            total_fields,
            matched_fields,
            match_ratio,
            by_section,
            by_type,
            near_misses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::{Control, InputKind};

    #[test]
    fn test_stats_counts_by_section_and_type() {
        let fields = vec![
            Field::new(
                "first_name",
                "First Name",
                Section::PatientInformation,
                Control::Input {
                    input_type: InputKind::Name,
                },
            ),
            Field::new("signature", "Signature", Section::Authorization, Control::Signature),
        ];

        let mut events = EventLog::new();
        events.push(ParseEvent::TemplateMatch {
            title: "First Name".into(),
            key: "first_name".into(),
            reason: MatchReason::TitleExact,
            score: 0.95,
        });

        let stats = DocumentStats::collect(&fields, &events);
        assert_eq!(stats.total_fields, 2);
        assert_eq!(stats.matched_fields, 1);
        assert_eq!(stats.by_section["Patient Information"], 1);
        assert_eq!(stats.by_type["signature"], 1);
        assert!((stats.match_ratio - 0.5).abs() < f32::EPSILON);
    }
}
