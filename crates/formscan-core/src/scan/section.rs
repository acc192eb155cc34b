//! Section tracking: heading classification and keyword-weighted scoring.

use super::context::ParseContext;
use super::patterns::{
    CHECKBOX, FIELD_LABEL_LINE, INSURANCE_BLOCK, PRIMARY_INSURANCE, SECONDARY_INSURANCE, WIDE_GAP,
};
use super::title::normalize_for_match;
use crate::models::field::{InsuranceScope, Section};

/// Keyword weights per section. Scored against the normalized heading text;
/// the highest total wins, ties break in declaration order.
const SECTION_KEYWORDS: &[(Section, &[(&str, f32)])] = &[
    (
        Section::PatientInformation,
        &[
            ("patient", 2.0),
            ("demographic", 3.0),
            ("about you", 3.0),
            ("personal", 1.5),
            ("registration", 2.0),
            ("information", 0.5),
        ],
    ),
    (
        Section::ContactInformation,
        &[("contact", 2.0), ("address", 2.0), ("phone", 1.5), ("email", 1.5)],
    ),
    (
        Section::EmergencyContact,
        &[("emergency", 4.0), ("in case of", 3.0), ("notify", 1.5)],
    ),
    (
        Section::Insurance,
        &[
            ("insurance", 4.0),
            ("subscriber", 3.0),
            ("policy", 2.0),
            ("carrier", 2.0),
            ("coverage", 2.0),
            ("benefit", 1.5),
        ],
    ),
    (
        Section::MedicalHistory,
        &[
            ("medical", 3.0),
            ("health", 2.5),
            ("history", 1.5),
            ("condition", 2.0),
            ("illness", 2.0),
            ("surgical", 2.0),
            ("surgery", 2.0),
        ],
    ),
    (
        Section::DentalHistory,
        &[
            ("dental", 3.5),
            ("teeth", 3.0),
            ("tooth", 3.0),
            ("oral", 2.5),
            ("gum", 2.5),
            ("orthodontic", 2.5),
        ],
    ),
    (
        Section::Medications,
        &[
            ("medication", 4.0),
            ("prescription", 3.0),
            ("drug", 2.0),
            ("allerg", 2.5),
            ("pharmacy", 2.5),
        ],
    ),
    (
        Section::Authorization,
        &[
            ("authorization", 4.0),
            ("consent", 4.0),
            ("agreement", 3.0),
            ("acknowledg", 3.0),
            ("hipaa", 4.0),
            ("privacy", 3.0),
            ("release", 2.0),
            ("assignment", 2.0),
            ("financial", 2.0),
            ("signature", 1.5),
        ],
    ),
];

/// Multi-word phrases that qualify a line as a heading even when its
/// casing alone would not.
const STRONG_HEADER_PHRASES: &[&str] = &[
    "patient information",
    "patient registration",
    "contact information",
    "emergency contact",
    "insurance information",
    "dental insurance",
    "medical history",
    "health history",
    "dental history",
    "medications and allergies",
    "consent for treatment",
    "financial policy",
    "hipaa",
    "authorization and release",
    "assignment of benefits",
];

/// Score a normalized heading against the keyword table.
pub fn classify_section(text: &str) -> (Section, f32) {
    let normalized = normalize_for_match(text);
    let mut best = (Section::General, 0.0f32);

    for (section, keywords) in SECTION_KEYWORDS {
        let score: f32 = keywords
            .iter()
            .filter(|(kw, _)| normalized.contains(kw))
            .map(|(_, w)| w)
            .sum();
        if score > best.1 {
            best = (*section, score);
        }
    }

    best
}

/// Structural heading test, independent of the parse context.
///
/// Requires: no checkboxes, no question mark, at most 120 characters, and
/// all-caps / title-case phrasing or a known strong-header phrase. Short
/// field labels ("Comments:") and multi-column grid headers are excluded.
pub fn looks_like_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.len() > 120 {
        return false;
    }
    if trimmed.contains('?') || trimmed.contains('_') || CHECKBOX.is_match(trimmed) {
        return false;
    }

    let normalized = normalize_for_match(trimmed);
    if STRONG_HEADER_PHRASES.iter().any(|p| normalized.contains(p)) {
        return true;
    }

    // Grid category headers ("A / B / C", wide-gapped columns) are not
    // section headings.
    if is_columnar(trimmed) {
        return false;
    }

    // Short field labels are fields, not headings.
    if FIELD_LABEL_LINE.is_match(trimmed) {
        return false;
    }

    if is_all_caps(trimmed) {
        return true;
    }

    // Title-case lines only qualify when they score against the section
    // table; otherwise they are indistinguishable from data.
    is_title_case(trimmed) && classify_section(trimmed).1 > 0.0
}

fn is_columnar(line: &str) -> bool {
    let by_slash = line.split(['/', '|']).filter(|t| !t.trim().is_empty()).count();
    if by_slash >= 2 && line.split_whitespace().count() <= 8 {
        return true;
    }
    WIDE_GAP.split(line.trim()).filter(|t| !t.trim().is_empty()).count() >= 2
}

fn is_all_caps(line: &str) -> bool {
    let letters: Vec<char> = line.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 3 && letters.iter().all(|c| c.is_uppercase())
}

fn is_title_case(line: &str) -> bool {
    let words: Vec<&str> = line
        .split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .collect();
    if words.is_empty() || words.len() > 6 {
        return false;
    }
    words.iter().all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
    })
}

/// Apply a line to the section tracker.
///
/// Returns `true` when the line was consumed as a heading. Insurance scope
/// anchors are applied even when the line is not itself a heading.
pub fn track(line: &str, index: usize, ctx: &mut ParseContext<'_>) -> bool {
    let trimmed = line.trim();

    // Dedicated scope anchors: bare anchor lines double as insurance
    // headings, embedded anchors only adjust the scope. Long prose lines
    // mentioning insurance are left to the terms recognizer.
    let anchor_candidate = trimmed.len() <= 80;
    let bare = !trimmed.contains('_') && trimmed.len() <= 50 && !trimmed.contains('?');
    if anchor_candidate && SECONDARY_INSURANCE.is_match(trimmed) {
        ctx.enter_section(Section::Insurance, index);
        ctx.scope = InsuranceScope::Secondary;
        return bare;
    }
    if anchor_candidate && PRIMARY_INSURANCE.is_match(trimmed) {
        ctx.enter_section(Section::Insurance, index);
        ctx.scope = InsuranceScope::Primary;
        return bare;
    }
    if bare && INSURANCE_BLOCK.is_match(trimmed) && looks_like_heading(trimmed) {
        ctx.enter_section(Section::Insurance, index);
        return true;
    }

    if !looks_like_heading(trimmed) {
        return false;
    }

    let (section, score) = classify_section(trimmed);
    if score > 0.0 {
        ctx.enter_section(section, index);
    } else {
        ctx.enter_section(Section::General, index);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;

    #[test]
    fn test_classify_section_picks_highest_score() {
        assert_eq!(classify_section("MEDICAL HISTORY").0, Section::MedicalHistory);
        assert_eq!(classify_section("Dental History").0, Section::DentalHistory);
        assert_eq!(classify_section("EMERGENCY CONTACT").0, Section::EmergencyContact);
        assert_eq!(classify_section("Insurance Information").0, Section::Insurance);
        assert_eq!(classify_section("random text").0, Section::General);
    }

    #[test]
    fn test_heading_guards() {
        assert!(looks_like_heading("PATIENT INFORMATION"));
        assert!(looks_like_heading("Medical History"));
        assert!(!looks_like_heading("Do you smoke?"));
        assert!(!looks_like_heading("[ ] Yes [ ] No"));
        assert!(!looks_like_heading("Comments:"));
        assert!(!looks_like_heading("Full Name:"));
        assert!(!looks_like_heading("Aches / Pains / Swelling"));
    }

    #[test]
    fn test_title_case_needs_section_score() {
        assert!(!looks_like_heading("John Smith"));
        assert!(looks_like_heading("Medications"));
    }

    #[test]
    fn test_track_updates_section_and_scope() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);

        assert!(track("INSURANCE INFORMATION", 5, &mut ctx));
        assert_eq!(ctx.section, Section::Insurance);
        assert_eq!(ctx.scope, InsuranceScope::Primary);

        assert!(track("Secondary Insurance", 12, &mut ctx));
        assert_eq!(ctx.scope, InsuranceScope::Secondary);

        assert!(track("MEDICAL HISTORY", 20, &mut ctx));
        assert_eq!(ctx.section, Section::MedicalHistory);
        assert_eq!(ctx.scope, InsuranceScope::None);
    }

    #[test]
    fn test_embedded_anchor_sets_scope_without_consuming() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);

        let consumed = track("Primary Insurance Company: ____________", 3, &mut ctx);
        assert!(!consumed);
        assert_eq!(ctx.section, Section::Insurance);
        assert_eq!(ctx.scope, InsuranceScope::Primary);
    }
}
