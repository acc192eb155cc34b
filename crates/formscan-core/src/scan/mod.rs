//! The forward-scanning field classifier.
//!
//! A single pass over the normalized, scrubbed lines: the section tracker,
//! recognizer chain, and grid detector cooperate line by line, each
//! recognizer claiming the lines it understands. The scan is strictly
//! sequential with bounded lookahead and no backtracking.

pub mod context;
pub mod grid;
pub mod patterns;
pub mod recognizers;
pub mod section;
pub mod title;

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::catalog::TemplateCatalog;
use crate::catalog::matcher::TemplateMatcher;
use crate::consolidate;
use crate::diagnostics::{DocumentStats, EventLog};
use crate::error::{ParseError, Result};
use crate::models::config::FormScanConfig;
use crate::models::field::{Control, Field, FieldCondition, Section};
use crate::text::{self, Line};

pub use context::ParseContext;
pub use grid::GridDescriptor;
pub use recognizers::{Recognizer, RecognizerMatch};

/// An unconfirmed field descriptor produced by the classifier, prior to
/// template matching and consolidation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCandidate {
    /// Derived key; unique only after consolidation.
    pub key: String,
    pub title: String,
    pub section: Section,
    pub optional: bool,
    pub control: Control,
    pub condition: Option<FieldCondition>,
    /// Original line index, for diagnostics.
    pub line: usize,
    /// True when the key was assigned explicitly rather than derived from
    /// the title. Only explicit keys participate in key-exact matching.
    pub keyed: bool,
}

impl FieldCandidate {
    /// Candidate with a key derived from the title, scope suffix applied.
    pub fn new(title: &str, control: Control, ctx: &mut ParseContext<'_>, line: usize) -> Self {
        let slug = title::slugify(title);
        let base = if slug.is_empty() {
            ctx.anonymous_key()
        } else {
            slug
        };
        Self {
            key: ctx.scoped_key(&base),
            title: title.to_string(),
            section: ctx.section,
            optional: false,
            control,
            condition: None,
            line,
            keyed: false,
        }
    }

    /// Candidate with a fixed key, exempt from scope suffixing.
    pub fn with_key(
        key: &str,
        title: &str,
        control: Control,
        ctx: &ParseContext<'_>,
        line: usize,
    ) -> Self {
        Self {
            key: key.to_string(),
            title: title.to_string(),
            section: ctx.section,
            optional: false,
            control,
            condition: None,
            line,
            keyed: true,
        }
    }

    pub fn into_field(self) -> Field {
        Field {
            key: self.key,
            title: self.title,
            section: self.section,
            optional: self.optional,
            control: self.control,
            condition: self.condition,
        }
    }
}

/// Result of parsing one document.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Ordered, consolidated field descriptors.
    pub fields: Vec<Field>,

    /// Per-document statistics.
    pub stats: DocumentStats,

    /// Non-fatal structural warnings from the validation pass.
    pub warnings: Vec<String>,

    /// Diagnostics collected during the scan and matching.
    pub events: EventLog,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// The parsing pipeline: normalizer, scrubber, classifier scan, template
/// matcher, and consolidator.
///
/// Holds a shared read-only catalog; one parser serves any number of
/// documents and is safe to reuse across worker threads.
pub struct FormParser {
    config: FormScanConfig,
    catalog: Arc<TemplateCatalog>,
}

impl FormParser {
    /// Create a parser with default configuration.
    pub fn new(catalog: Arc<TemplateCatalog>) -> Self {
        Self {
            config: FormScanConfig::default(),
            catalog,
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: FormScanConfig) -> Self {
        self.config = config;
        self
    }

    /// Parse raw document bytes, decoding with the legacy fallback.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<ParseOutcome> {
        let text = text::decode_text(bytes)?;
        self.parse(&text)
    }

    /// Parse one document of plain text into field descriptors.
    pub fn parse(&self, text: &str) -> Result<ParseOutcome> {
        let start = Instant::now();

        let lines = text::scrub(text::normalize(text), &self.config.scrub);
        if lines.iter().all(|l| l.is_blank()) {
            return Err(ParseError::NoContent.into());
        }

        info!("scanning {} lines", lines.len());

        let mut ctx = ParseContext::new(&self.config);
        let chain = recognizers::default_chain();
        let candidates = scan(&lines, &chain, &mut ctx);

        debug!("classifier produced {} candidates", candidates.len());

        let matcher = TemplateMatcher::new(&self.catalog, &self.config.matching);
        let mut candidates = candidates;
        let mut renames: std::collections::HashMap<String, String> = std::collections::HashMap::new();
        for candidate in &mut candidates {
            let old_key = candidate.key.clone();
            if matcher.apply(candidate, &mut ctx.events).is_some() && candidate.key != old_key {
                renames.insert(old_key, candidate.key.clone());
            }
        }

        // Conditional fields follow their boolean parent by key; keep the
        // link intact when matching replaced the parent's key.
        for candidate in &mut candidates {
            if let Some(condition) = &mut candidate.condition {
                if let Some(new_key) = renames.get(&condition.key) {
                    condition.key = new_key.clone();
                }
            }
        }

        let (fields, warnings) = consolidate::consolidate(candidates);
        let stats = DocumentStats::collect(&fields, &ctx.events);

        info!(
            fields = fields.len(),
            matched = stats.matched_fields,
            "parse complete"
        );

        Ok(ParseOutcome {
            fields,
            stats,
            warnings,
            events: ctx.events,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

/// The classifier loop: headings to the section tracker, everything else
/// to the first recognizer that claims it.
fn scan(
    lines: &[Line],
    chain: &[Box<dyn Recognizer>],
    ctx: &mut ParseContext<'_>,
) -> Vec<FieldCandidate> {
    let mut candidates = Vec::new();
    let mut at = 0;

    while at < lines.len() {
        if lines[at].is_blank() {
            at += 1;
            continue;
        }

        if section::track(&lines[at].text, lines[at].index, ctx) {
            at += 1;
            continue;
        }

        let mut advanced = false;
        for recognizer in chain {
            if let Some(matched) = recognizer.try_match(lines, at, ctx) {
                debug!(
                    recognizer = recognizer.name(),
                    line = lines[at].index,
                    consumed = matched.consumed,
                    produced = matched.candidates.len(),
                    "recognizer match"
                );
                candidates.extend(matched.candidates);
                at += matched.consumed;
                advanced = true;
                break;
            }
        }

        // The fallback always claims, but never loop on a stuck line.
        if !advanced {
            at += 1;
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::InsuranceScope;

    #[test]
    fn test_candidate_key_from_title() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);

        let candidate = FieldCandidate::new(
            "Date of Birth",
            Control::Input {
                input_type: crate::models::field::InputKind::Text,
            },
            &mut ctx,
            0,
        );
        assert_eq!(candidate.key, "date_of_birth");
    }

    #[test]
    fn test_candidate_key_scoped_in_insurance() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        ctx.enter_section(Section::Insurance, 0);
        ctx.scope = InsuranceScope::Secondary;

        let candidate = FieldCandidate::new(
            "Group Number",
            Control::Input {
                input_type: crate::models::field::InputKind::Text,
            },
            &mut ctx,
            0,
        );
        assert_eq!(candidate.key, "group_number__secondary");
    }

    #[test]
    fn test_empty_title_gets_anonymous_key() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);

        let candidate = FieldCandidate::new(
            "",
            Control::Input {
                input_type: crate::models::field::InputKind::Text,
            },
            &mut ctx,
            0,
        );
        assert_eq!(candidate.key, "field_1");
    }

    fn parser() -> FormParser {
        FormParser::new(Arc::new(TemplateCatalog::embedded().unwrap()))
    }

    fn field_by_title<'a>(fields: &'a [Field], title: &str) -> &'a Field {
        fields
            .iter()
            .find(|f| f.title == title)
            .unwrap_or_else(|| panic!("no field titled {title:?}"))
    }

    #[test]
    fn test_scenario_inline_options() {
        let outcome = parser().parse("Gender: [ ] Male [ ] Female").unwrap();

        let gender = field_by_title(&outcome.fields, "Gender");
        let names: Vec<&str> = gender
            .control
            .options()
            .unwrap()
            .iter()
            .map(|o| o.name.as_str())
            .collect();
        assert_eq!(names, vec!["Male", "Female"]);
    }

    #[test]
    fn test_scenario_yes_no_without_guidance() {
        let outcome = parser().parse("Do you smoke? [ ] Yes [ ] No").unwrap();

        let smoke = field_by_title(&outcome.fields, "Do you smoke?");
        let options = smoke.control.options().unwrap();
        assert_eq!(options[0].value, crate::models::field::ChoiceValue::Bool(true));
        assert_eq!(options[1].value, crate::models::field::ChoiceValue::Bool(false));

        // No conditional detail field without a guidance phrase.
        assert!(outcome.fields.iter().all(|f| f.condition.is_none()));
    }

    #[test]
    fn test_scenario_yes_no_with_guidance() {
        let outcome = parser()
            .parse("Do you smoke? [ ] Yes [ ] No\nIf yes, please explain")
            .unwrap();

        let smoke = field_by_title(&outcome.fields, "Do you smoke?");
        let detail = outcome
            .fields
            .iter()
            .find(|f| f.condition.is_some())
            .expect("conditional detail field");

        let condition = detail.condition.as_ref().unwrap();
        assert_eq!(condition.key, smoke.key);
        assert!(condition.value);
    }

    #[test]
    fn test_scenario_grid_with_category_headers() {
        let text = "MEDICAL HISTORY\n\
                    Head / Heart / Lungs\n\
                    [ ] Headaches   [ ] Murmur       [ ] Asthma\n\
                    [ ] Dizziness   [ ] Chest Pain   [ ] Bronchitis\n\
                    [ ] Fainting    [ ] Palpitations [ ] Emphysema\n";

        let outcome = parser().parse(text).unwrap();

        let grid = outcome
            .fields
            .iter()
            .find(|f| f.control.is_multi_select())
            .expect("grid multi-select");
        let names: Vec<&str> = grid
            .control
            .options()
            .unwrap()
            .iter()
            .map(|o| o.name.as_str())
            .collect();

        assert_eq!(names.len(), 9);
        assert!(names.iter().all(|n| {
            n.starts_with("Head - ") || n.starts_with("Heart - ") || n.starts_with("Lungs - ")
        }));
        assert!(names.contains(&"Heart - Palpitations"));
    }

    #[test]
    fn test_single_signature_invariant() {
        // No signature in the document: one is synthesized.
        let outcome = parser().parse("First Name:\nLast Name:").unwrap();
        let signatures: Vec<&Field> = outcome
            .fields
            .iter()
            .filter(|f| matches!(f.control, Control::Signature))
            .collect();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].key, "signature");

        // Two signature lines in the document: still exactly one field.
        let outcome = parser()
            .parse("Patient Signature: ______\n\nGuardian Signature: ______")
            .unwrap();
        let signatures = outcome
            .fields
            .iter()
            .filter(|f| matches!(f.control, Control::Signature))
            .count();
        assert_eq!(signatures, 1);
    }

    #[test]
    fn test_keys_globally_unique() {
        let text = "Phone:\nPhone:\nPhone:\n";
        let outcome = parser().parse(text).unwrap();

        let mut keys: Vec<&str> = outcome.fields.iter().map(|f| f.key.as_str()).collect();
        let total = keys.len();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_option_values_never_empty() {
        let text = "PATIENT INFORMATION\n\
                    Gender: [ ] Male [ ] Female\n\
                    Do you smoke? [ ] Yes [ ] No\n\
                    Marital Status: [ ] Single [ ] Married [ ] Divorced\n";
        let outcome = parser().parse(text).unwrap();

        for field in &outcome.fields {
            if let Some(options) = field.control.options() {
                for option in options {
                    assert!(!option.value.is_empty(), "{}: empty option value", field.key);
                }
            }
        }
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_idempotent_output() {
        let text = "PATIENT INFORMATION\n\
                    First Name:            Last Name:\n\
                    Date of Birth: __/__/____\n\
                    Gender: [ ] Male [ ] Female\n\
                    \n\
                    MEDICAL HISTORY\n\
                    Do you smoke? [ ] Yes [ ] No\n\
                    If yes, please explain\n\
                    \n\
                    Signature: __________________ Date: ________\n";

        let parser = parser();
        let first = serde_json::to_string(&parser.parse(text).unwrap().fields).unwrap();
        let second = serde_json::to_string(&parser.parse(text).unwrap().fields).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insurance_scope_suffixes_keys() {
        let text = "INSURANCE INFORMATION\n\
                    Subscriber ID:\n\
                    Group Number:\n\
                    \n\
                    Secondary Insurance\n\
                    Subscriber ID:\n\
                    Group Number:\n";
        let outcome = parser().parse(text).unwrap();

        let keys: Vec<&str> = outcome.fields.iter().map(|f| f.key.as_str()).collect();
        assert!(keys.contains(&"subscriber_id__primary"));
        assert!(keys.contains(&"subscriber_id__secondary"));
        assert!(keys.contains(&"group_number__primary"));
        assert!(keys.contains(&"group_number__secondary"));
    }

    #[test]
    fn test_empty_document_is_error() {
        assert!(parser().parse("\n\n\n").is_err());
    }

    #[test]
    fn test_stats_track_matches() {
        let outcome = parser().parse("Date of Birth: __/__/____").unwrap();
        assert!(outcome.stats.matched_fields >= 1);
        assert!(outcome.stats.total_fields >= 1);
        assert!(outcome
            .events
            .matches()
            .next()
            .is_some());
    }
}
