//! Tiered matching of field candidates against the template catalog.
//!
//! Tiers run in order, first hit wins: key-exact, title-exact,
//! alias-exact, alias-contains, fuzzy. The fuzzy tier combines token
//! Jaccard with character-sequence similarity and is gated off entirely
//! for large condition collectors.

use std::collections::HashSet;

use strsim::normalized_levenshtein;
use tracing::debug;

use super::{TemplateCatalog, TemplateEntry};
use crate::diagnostics::{EventLog, MatchReason, ParseEvent};
use crate::models::config::MatchConfig;
use crate::models::field::{InsuranceScope, Section};
use crate::scan::FieldCandidate;
use crate::scan::title::normalize_for_match;

/// Words that mark a field as belonging to a related person rather than
/// the patient; a generic alias must not absorb such fields.
const RELATION_WORDS: &[&str] = &["parent", "guardian", "spouse", "mother", "father", "child"];

/// Keywords identifying condition-collector options.
const CONDITION_KEYWORDS: &[&str] = &[
    "diabetes", "asthma", "cancer", "heart", "blood pressure", "arthritis", "anemia",
    "hepatitis", "kidney", "thyroid", "stroke", "seizure", "ulcer", "tuberculosis",
    "glaucoma", "allergy", "allergies", "murmur", "emphysema",
];

/// Section keywords granting the relaxed fuzzy threshold.
const RELAXED_KEYWORDS: &[&str] = &[
    "patient", "medical", "dental", "health", "physician", "dentist", "doctor",
];

/// A successful match, for diagnostics and callers that want the details.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    /// Adopted key, scope suffix re-applied.
    pub key: String,
    pub reason: MatchReason,
    pub score: f32,
    /// Token coverage of the template title (fuzzy tier only; 1.0 otherwise).
    pub coverage: f32,
}

/// The matching engine. Borrows the read-only catalog; cheap to construct
/// per document.
pub struct TemplateMatcher<'a> {
    catalog: &'a TemplateCatalog,
    config: &'a MatchConfig,
}

impl<'a> TemplateMatcher<'a> {
    pub fn new(catalog: &'a TemplateCatalog, config: &'a MatchConfig) -> Self {
        Self { catalog, config }
    }

    /// Match a candidate and, on success, rewrite its key and control from
    /// the template. The parsed title, section, and optionality stay.
    pub fn apply(
        &self,
        candidate: &mut FieldCandidate,
        events: &mut EventLog,
    ) -> Option<MatchOutcome> {
        let (entry, reason, score, coverage) = self.find(candidate, events)?;

        let (_, scope) = InsuranceScope::strip(&candidate.key);
        let key = scope.apply(&entry.field.key);

        debug!(
            title = %candidate.title,
            key = %key,
            reason = reason.as_str(),
            score,
            "template match"
        );
        events.push(ParseEvent::TemplateMatch {
            title: candidate.title.clone(),
            key: key.clone(),
            reason,
            score,
        });

        candidate.key = key.clone();
        candidate.control = entry.field.control.clone();

        Some(MatchOutcome {
            key,
            reason,
            score,
            coverage,
        })
    }

    fn find(
        &self,
        candidate: &FieldCandidate,
        events: &mut EventLog,
    ) -> Option<(&'a TemplateEntry, MatchReason, f32, f32)> {
        let (base_key, scope) = InsuranceScope::strip(&candidate.key);
        let norm_title = normalize_for_match(&candidate.title);
        let cand_tokens: HashSet<&str> = norm_title.split(' ').filter(|t| !t.is_empty()).collect();
        let cand_options = normalized_options(candidate);

        // Tier 1: key match. Only explicitly assigned keys qualify;
        // title-derived slugs are matched through the title tiers.
        if candidate.keyed {
            if let Some(entry) = self.catalog.get(&candidate.key) {
                return Some((entry, MatchReason::KeyExact, 1.0, 1.0));
            }
            if scope != InsuranceScope::None {
                if let Some(entry) = self.catalog.get(base_key) {
                    return Some((entry, MatchReason::KeyBase, 0.98, 1.0));
                }
            }
        }

        // Disjoint option sets veto the exact tiers: a template must not
        // absorb a candidate whose harvested options it does not cover.
        let options_compatible = |entry: &TemplateEntry, overlap: f32| {
            cand_options.is_empty()
                || entry.option_names().is_empty()
                || overlap >= self.config.min_option_overlap
        };

        // Tier 2: exact normalized title.
        for entry in self.catalog.entries() {
            if entry.norm_title() == norm_title {
                let overlap = option_overlap(&cand_options, entry.option_names());
                if !options_compatible(entry, overlap) {
                    continue;
                }
                let score = 0.95 * overlap + section_adjustment(entry, candidate, scope);
                return Some((entry, MatchReason::TitleExact, score, 1.0));
            }
        }

        // Tier 3: exact alias phrase (equality, or the phrase embedded
        // whole in the title), guarded against relation-labeled fields.
        for (phrase, entry) in self.catalog.aliases() {
            let hit = phrase == norm_title || contains_phrase(&norm_title, phrase);
            if hit && !relation_mismatch(&cand_tokens, phrase) {
                let overlap = option_overlap(&cand_options, entry.option_names());
                if !options_compatible(entry, overlap) {
                    continue;
                }
                return Some((entry, MatchReason::AliasExact, 0.96 * overlap, 1.0));
            }
        }

        // Tier 4: every alias token present (whole-word, any order),
        // guarded by section compatibility.
        for (phrase, entry) in self.catalog.aliases() {
            let tokens: Vec<&str> = phrase.split(' ').collect();
            if !tokens.iter().all(|t| cand_tokens.contains(t)) {
                continue;
            }
            if relation_mismatch(&cand_tokens, phrase) {
                continue;
            }
            if entry.field.section == Section::Insurance
                && candidate.section != Section::Insurance
                && scope == InsuranceScope::None
            {
                continue;
            }
            let overlap = option_overlap(&cand_options, entry.option_names());
            if !options_compatible(entry, overlap) {
                continue;
            }
            return Some((entry, MatchReason::AliasContains, 0.93 * overlap, 1.0));
        }

        // Tier 5: fuzzy, disabled for large condition collectors.
        if self.is_condition_collector(candidate) {
            events.push(ParseEvent::FuzzyGate {
                title: candidate.title.clone(),
                reason: "condition collector".to_string(),
            });
            return None;
        }

        let mut best: Option<(&TemplateEntry, f32, f32)> = None;
        for entry in self.catalog.entries() {
            let entry_tokens = entry.title_tokens();
            if entry_tokens.is_empty() {
                continue;
            }

            let present = entry_tokens
                .iter()
                .filter(|t| cand_tokens.contains(t.as_str()))
                .count();
            let coverage = present as f32 / entry_tokens.len() as f32;
            let required = if entry_tokens.len() > self.config.long_title_tokens {
                self.config.coverage_long
            } else {
                self.config.coverage_short
            };
            if coverage <= required {
                continue;
            }

            let entry_set: HashSet<&str> = entry_tokens.iter().map(String::as_str).collect();
            let jaccard = token_jaccard(&cand_tokens, &entry_set);
            let char_sim = normalized_levenshtein(&norm_title, entry.norm_title()) as f32;
            let score = 0.45 * jaccard + 0.45 * char_sim;

            if best.map(|(_, s, _)| score > s).unwrap_or(true) {
                best = Some((entry, score, coverage));
            }
        }

        let (entry, raw, coverage) = best?;
        let overlap = option_overlap(&cand_options, entry.option_names());
        let mut score = raw + section_adjustment(entry, candidate, scope);
        if !cand_options.is_empty() && !entry.option_names().is_empty() {
            score += 0.05 * (2.0 * overlap - 1.0);
        }

        let threshold = if self.relaxed_applies(candidate, &norm_title) {
            self.config.relaxed_threshold
        } else {
            self.config.accept_threshold
        };

        if score >= threshold {
            return Some((entry, MatchReason::Fuzzy, score, coverage));
        }

        if score >= self.config.near_miss_floor {
            debug!(
                title = %candidate.title,
                key = %entry.field.key,
                score,
                "fuzzy near miss"
            );
            events.push(ParseEvent::NearMiss {
                title: candidate.title.clone(),
                key: entry.field.key.clone(),
                score,
            });
        }

        None
    }

    /// Large multi-selects full of condition names never fuzzy-match; a
    /// harvested checklist is its own field, not a mislabeled template.
    fn is_condition_collector(&self, candidate: &FieldCandidate) -> bool {
        let Some(options) = candidate.control.options() else {
            return false;
        };
        if options.len() < self.config.collector_min_options {
            return false;
        }
        let hits = options
            .iter()
            .filter(|o| {
                let lower = o.name.to_lowercase();
                CONDITION_KEYWORDS.iter().any(|k| lower.contains(k))
            })
            .count();
        hits >= self.config.collector_min_keywords
    }

    fn relaxed_applies(&self, candidate: &FieldCandidate, norm_title: &str) -> bool {
        let section_ok = matches!(
            candidate.section,
            Section::PatientInformation
                | Section::MedicalHistory
                | Section::DentalHistory
                | Section::Medications
        );
        section_ok && RELAXED_KEYWORDS.iter().any(|k| norm_title.contains(k))
    }
}

/// Jaccard similarity over normalized option-name sets; 1.0 when either
/// side has no options.
pub fn option_overlap(cand: &[String], entry: &[String]) -> f32 {
    if cand.is_empty() || entry.is_empty() {
        return 1.0;
    }
    let a: HashSet<&str> = cand.iter().map(String::as_str).collect();
    let b: HashSet<&str> = entry.iter().map(String::as_str).collect();
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        1.0
    } else {
        intersection as f32 / union as f32
    }
}

fn token_jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f32 / union as f32
}

fn normalized_options(candidate: &FieldCandidate) -> Vec<String> {
    candidate
        .control
        .options()
        .map(|options| {
            options
                .iter()
                .map(|o| normalize_for_match(&o.name))
                .collect()
        })
        .unwrap_or_default()
}

fn section_adjustment(entry: &TemplateEntry, candidate: &FieldCandidate, scope: InsuranceScope) -> f32 {
    if entry.field.section == candidate.section {
        0.02
    } else if entry.field.section == Section::Insurance
        && candidate.section != Section::Insurance
        && scope == InsuranceScope::None
    {
        -0.04
    } else {
        0.0
    }
}

/// Whole-word contiguous containment of `phrase` in `title`.
fn contains_phrase(title: &str, phrase: &str) -> bool {
    let padded_title = format!(" {title} ");
    let padded_phrase = format!(" {phrase} ");
    padded_title.contains(&padded_phrase)
}

/// True when the candidate names a related person the alias does not.
fn relation_mismatch(cand_tokens: &HashSet<&str>, phrase: &str) -> bool {
    RELATION_WORDS
        .iter()
        .any(|w| cand_tokens.contains(w) && !contains_phrase(phrase, w))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;
    use crate::models::field::{Choice, Control, DateKind, InputKind};
    use crate::scan::ParseContext;

    fn catalog() -> TemplateCatalog {
        TemplateCatalog::embedded().unwrap()
    }

    fn candidate(title: &str, control: Control) -> FieldCandidate {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        FieldCandidate::new(title, control, &mut ctx, 0)
    }

    fn input(title: &str) -> FieldCandidate {
        candidate(
            title,
            Control::Input {
                input_type: InputKind::Text,
            },
        )
    }

    #[test]
    fn test_title_exact_match() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("Date of Birth");
        let outcome = matcher.apply(&mut cand, &mut events).unwrap();

        assert_eq!(outcome.reason, MatchReason::TitleExact);
        assert_eq!(cand.key, "date_of_birth");
        assert!(matches!(
            cand.control,
            Control::Date {
                input_type: DateKind::Past
            }
        ));
        // Parsed title is kept.
        assert_eq!(cand.title, "Date of Birth");
    }

    #[test]
    fn test_alias_exact_match() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("DOB");
        let outcome = matcher.apply(&mut cand, &mut events).unwrap();
        assert_eq!(outcome.reason, MatchReason::AliasExact);
        assert_eq!(cand.key, "date_of_birth");
    }

    #[test]
    fn test_generic_alias_guard_blocks_relation_fields() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("Parent/Guardian Social Security Number");
        let outcome = matcher.apply(&mut cand, &mut events);

        // Must not be absorbed into the patient's plain `ssn` entry.
        if let Some(outcome) = outcome {
            assert_ne!(outcome.key, "ssn");
        }
    }

    #[test]
    fn test_scope_suffix_reapplied() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("Subscriber ID");
        cand.key = "subscriber_id__secondary".to_string();
        cand.section = Section::Insurance;

        let outcome = matcher.apply(&mut cand, &mut events).unwrap();
        assert_eq!(cand.key, "subscriber_id__secondary");
        assert_eq!(outcome.reason, MatchReason::TitleExact);
    }

    #[test]
    fn test_fuzzy_match_close_title() {
        let json = r#"{
            "General": [
                {"key": "responsible_party_name",
                 "title": "Name of Person Responsible for This Account",
                 "section": "General", "type": "input",
                 "control": {"input_type": "name"}}
            ]
        }"#;
        let catalog = TemplateCatalog::from_json(json).unwrap();
        let config = MatchConfig {
            accept_threshold: 0.8,
            ..MatchConfig::default()
        };
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        // One inserted token off the canonical title.
        let mut cand = input("Name of the Person Responsible for This Account");
        let outcome = matcher.apply(&mut cand, &mut events).unwrap();
        assert_eq!(outcome.key, "responsible_party_name");
        assert_eq!(outcome.reason, MatchReason::Fuzzy);
        assert!(outcome.coverage > 0.8);
    }

    #[test]
    fn test_fuzzy_near_miss_logged_below_threshold() {
        let json = r#"{
            "General": [
                {"key": "responsible_party_name",
                 "title": "Name of Person Responsible for This Account",
                 "section": "General", "type": "input",
                 "control": {"input_type": "name"}}
            ]
        }"#;
        let catalog = TemplateCatalog::from_json(json).unwrap();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("Name of the Person Responsible for This Account");
        assert!(matcher.apply(&mut cand, &mut events).is_none());
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, ParseEvent::NearMiss { .. })));
    }

    #[test]
    fn test_condition_collector_skips_fuzzy() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let names = [
            "Diabetes", "Asthma", "Cancer", "Stroke", "Arthritis", "Anemia", "Hepatitis",
            "Kidney Disease", "Thyroid Problems",
        ];
        let options: Vec<Choice> = names.iter().map(|n| Choice::tagged(*n)).collect();
        let mut cand = candidate(
            "Please mark any conditions that apply to you",
            Control::Radio {
                options,
                multi: true,
            },
        );
        cand.section = Section::MedicalHistory;

        assert!(matcher.apply(&mut cand, &mut events).is_none());
        assert!(events
            .events()
            .iter()
            .any(|e| matches!(e, ParseEvent::FuzzyGate { .. })));
    }

    #[test]
    fn test_unmatched_candidate_untouched() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        let mut cand = input("Favorite color");
        assert!(matcher.apply(&mut cand, &mut events).is_none());
        assert_eq!(cand.key, "favorite_color");
    }

    #[test]
    fn test_option_overlap() {
        let a = vec!["male".to_string(), "female".to_string()];
        let b = vec!["male".to_string(), "female".to_string(), "other".to_string()];
        assert!((option_overlap(&a, &b) - 2.0 / 3.0).abs() < 1e-6);
        assert_eq!(option_overlap(&[], &b), 1.0);
        assert_eq!(option_overlap(&a, &[]), 1.0);
    }

    #[test]
    fn test_key_exact_only_for_explicit_keys() {
        let catalog = catalog();
        let config = MatchConfig::default();
        let matcher = TemplateMatcher::new(&catalog, &config);
        let mut events = EventLog::new();

        // Slug-derived key equal to a catalog key still reports the title
        // tier, per the matching contract.
        let mut cand = input("Date of Birth");
        assert_eq!(cand.key, "date_of_birth");
        let outcome = matcher.apply(&mut cand, &mut events).unwrap();
        assert_eq!(outcome.reason, MatchReason::TitleExact);

        let mut keyed = cand.clone();
        keyed.keyed = true;
        let outcome = matcher.apply(&mut keyed, &mut events).unwrap();
        assert_eq!(outcome.reason, MatchReason::KeyExact);
    }
}
