//! Common regex patterns for intake-form line classification.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Canonical checkbox token produced by the normalizer.
    pub static ref CHECKBOX: Regex = Regex::new(r"\[\s*[xX]?\s*\]").unwrap();

    // Signature and witness lines.
    pub static ref SIGNATURE_LINE: Regex = Regex::new(
        r"(?i)(?:\b(?:patient|parent|guardian|responsible\s+party|client)\s+)?\bsignature\b|\bsign\s+here\b|^\s*x\s*_{3,}"
    ).unwrap();

    pub static ref WITNESS_LINE: Regex = Regex::new(
        r"(?i)\bwitness\b"
    ).unwrap();

    pub static ref DATE_LABEL: Regex = Regex::new(
        r"(?i)^\s*(?:today'?s\s+)?date\b[\s:_/]*$"
    ).unwrap();

    // Condition-block openers ("Have you ever had ...?").
    pub static ref CONDITION_QUESTION: Regex = Regex::new(
        r"(?i)\b(?:have\s+you\s+(?:ever\s+)?(?:had|been)|do\s+you\s+(?:currently\s+)?have|are\s+you\s+(?:currently\s+)?taking)\b"
    ).unwrap();

    // Compound "<prompt> [ ] Yes ... [ ] No" lines.
    pub static ref YES_NO_COMPOUND: Regex = Regex::new(
        r"(?i)^(.*?)[\s:]*\[\s*x?\s*\]\s*yes\b[^\[]*\[\s*x?\s*\]\s*no\b"
    ).unwrap();

    // Reversed order also appears ("[ ] No [ ] Yes").
    pub static ref NO_YES_COMPOUND: Regex = Regex::new(
        r"(?i)^(.*?)[\s:]*\[\s*x?\s*\]\s*no\b[^\[]*\[\s*x?\s*\]\s*yes\b"
    ).unwrap();

    // Guidance phrases that open a conditional detail field.
    pub static ref GUIDANCE: Regex = Regex::new(
        r"(?i)\b(?:if\s+yes|if\s+so|please\s+(?:explain|list|describe|specify)|explain\s+below)\b"
    ).unwrap();

    // "Label: value" pairs on composite lines. Labels are capitalized short
    // phrases; the value area is blanks or free text up to the next label.
    pub static ref LABEL_VALUE: Regex = Regex::new(
        r"([A-Z][A-Za-z'./#]*(?:\s+(?:of|Of)?\s*[A-Z][A-Za-z'./#]*){0,4})\s*:"
    ).unwrap();

    // Known short field labels that must never be taken for headings.
    pub static ref FIELD_LABEL_LINE: Regex = Regex::new(
        r"^[A-Z][A-Za-z'./#]*(?:\s+[A-Z][A-Za-z'./#]*)?:\s*$"
    ).unwrap();

    // Insurance scope anchors.
    pub static ref PRIMARY_INSURANCE: Regex = Regex::new(
        r"(?i)\bprimary\b(?:\s+\w+){0,2}\s+insurance|\binsurance\b(?:\s+\w+){0,2}\s*[-:]?\s*\bprimary\b"
    ).unwrap();

    pub static ref SECONDARY_INSURANCE: Regex = Regex::new(
        r"(?i)\bsecondary\b(?:\s+\w+){0,2}\s+insurance|\binsurance\b(?:\s+\w+){0,2}\s*[-:]?\s*\bsecondary\b"
    ).unwrap();

    pub static ref INSURANCE_BLOCK: Regex = Regex::new(
        r"(?i)\binsurance\s+(?:information|company|carrier|coverage)\b|\binsured\s+party\b|\bpolicy\s*holder\b"
    ).unwrap();

    // Wide-whitespace column separators (three or more spaces).
    pub static ref WIDE_GAP: Regex = Regex::new(r" {3,}").unwrap();

    // Trailing fill-in artifacts stripped during title cleanup.
    pub static ref TRAILING_FILL: Regex = Regex::new(
        r"(?:[\s:_]|_{2,}|\(\s*\)|\b(?:mm|dd|yy(?:yy)?)\b|[/\-](?:\s*[/\-])*)+$"
    ).unwrap();

    // Placeholder date artifacts anywhere in a title ("__/__/____").
    pub static ref DATE_PLACEHOLDER: Regex = Regex::new(
        r"_{0,4}\s*/\s*_{0,4}\s*/\s*_{0,4}"
    ).unwrap();

    // Sentence-like lines (used to guard composite-label splitting).
    pub static ref SENTENCE_LIKE: Regex = Regex::new(
        r"(?i)^(?:please|i\s|we\s|the\s|this\s|by\s+signing)"
    ).unwrap();

    // Bullet list markers surviving normalization.
    pub static ref BULLET: Regex = Regex::new(r"^\s*[-*]\s+").unwrap();
}

/// Byte offsets of every checkbox token on a line.
pub fn checkbox_offsets(line: &str) -> Vec<usize> {
    CHECKBOX.find_iter(line).map(|m| m.start()).collect()
}

/// Number of checkbox tokens on a line.
pub fn checkbox_count(line: &str) -> usize {
    CHECKBOX.find_iter(line).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_variants() {
        assert_eq!(checkbox_count("[ ] Yes [x] No [X] Maybe [] Other"), 4);
    }

    #[test]
    fn test_yes_no_compound_captures_prompt() {
        let caps = YES_NO_COMPOUND
            .captures("Do you smoke? [ ] Yes [ ] No")
            .unwrap();
        assert_eq!(caps[1].trim(), "Do you smoke?");
    }

    #[test]
    fn test_condition_question() {
        assert!(CONDITION_QUESTION.is_match("Have you ever had any of the following?"));
        assert!(CONDITION_QUESTION.is_match("Are you taking any medications?"));
        assert!(!CONDITION_QUESTION.is_match("Emergency contact name"));
    }

    #[test]
    fn test_label_value_pairs() {
        let line = "Height: ____ Weight: ____ Date of Birth: __/__/____";
        let labels: Vec<&str> = LABEL_VALUE
            .captures_iter(line)
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(labels, vec!["Height", "Weight", "Date of Birth"]);
    }

    #[test]
    fn test_insurance_anchors() {
        assert!(PRIMARY_INSURANCE.is_match("Primary Dental Insurance"));
        assert!(SECONDARY_INSURANCE.is_match("Insurance - Secondary"));
        assert!(INSURANCE_BLOCK.is_match("Insurance Information"));
    }

    #[test]
    fn test_signature_and_witness() {
        assert!(SIGNATURE_LINE.is_match("Patient Signature: ____________"));
        assert!(SIGNATURE_LINE.is_match("X ______________________"));
        assert!(WITNESS_LINE.is_match("Witness: _______"));
    }
}
