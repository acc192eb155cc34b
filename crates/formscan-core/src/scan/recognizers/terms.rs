//! Long-paragraph detection for agreement ("terms") fields.

use super::signature::is_signature_line;
use super::{Recognizer, RecognizerMatch};
use crate::models::field::Control;
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{BULLET, FIELD_LABEL_LINE, checkbox_count};
use crate::scan::section::looks_like_heading;
use crate::text::Line;

/// Default agreement text attached to terms fields.
const AGREE_TEXT: &str = "I have read and agree to the terms above";

/// Recognizes a run of prose lines long enough to be an agreement block
/// and emits it as a terms field. Embedded headings end the run, so a
/// document with several consent paragraphs yields several terms fields.
pub struct TermsRecognizer;

impl Recognizer for TermsRecognizer {
    fn name(&self) -> &'static str {
        "terms"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let mut gathered: Vec<&str> = Vec::new();

        for line in &lines[at..] {
            if line.is_blank() || !is_prose(&line.text) {
                break;
            }
            gathered.push(line.text.trim());
        }

        if gathered.is_empty() {
            return None;
        }

        let text = gathered.join(" ");
        let terminators = text.matches(['.', '!', '?']).count();

        if text.len() <= ctx.config.classify.terms_min_chars
            || terminators < ctx.config.classify.terms_min_sentences
        {
            return None;
        }

        let title = derive_title(&text);
        let candidate = FieldCandidate::new(
            &title,
            Control::Terms {
                agree_text: AGREE_TEXT.to_string(),
                html_text: text,
            },
            ctx,
            lines[at].index,
        );

        Some(RecognizerMatch::single(candidate, gathered.len()))
    }
}

/// Prose lines: no checkboxes, bullets, fill-ins, headings, or labels.
fn is_prose(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && checkbox_count(trimmed) == 0
        && !BULLET.is_match(trimmed)
        && !looks_like_heading(trimmed)
        && !FIELD_LABEL_LINE.is_match(trimmed)
        && !is_signature_line(trimmed)
        && !trimmed.contains("___")
}

/// Title from the opening clause, bounded for key derivation.
fn derive_title(text: &str) -> String {
    let first_sentence = text
        .split_inclusive(['.', '!', '?'])
        .next()
        .unwrap_or(text)
        .trim_end_matches(['.', '!', '?'])
        .trim();

    let mut title: String = first_sentence.chars().take(80).collect();
    if title.len() < first_sentence.len() {
        title = title
            .rsplit_once(' ')
            .map(|(head, _)| head.to_string())
            .unwrap_or(title);
    }

    if title.is_empty() {
        "Terms".to_string()
    } else {
        title
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::new(*t, i))
            .collect()
    }

    const CONSENT: &[&str] = &[
        "I authorize the release of any medical or other information necessary to process",
        "insurance claims on my behalf. I understand that payment is due at the time of",
        "service and that I am financially responsible for any balance not covered by my",
        "insurance carrier. A service charge may apply to accounts past due.",
    ];

    #[test]
    fn test_long_paragraph_becomes_terms() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(CONSENT);

        let m = TermsRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 4);

        let candidate = &m.candidates[0];
        match &candidate.control {
            Control::Terms { html_text, agree_text } => {
                assert!(html_text.contains("financially responsible"));
                assert!(!agree_text.is_empty());
            }
            other => panic!("expected terms control, got {:?}", other),
        }
    }

    #[test]
    fn test_short_paragraph_declines() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["I agree to the terms. Thank you."]);

        assert!(TermsRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_run_stops_at_heading() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let mut texts: Vec<&str> = CONSENT.to_vec();
        texts.push("HIPAA PRIVACY NOTICE");
        texts.push("A second paragraph follows here.");
        let lines = lines(&texts);

        let m = TermsRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 4);
    }

    #[test]
    fn test_checkbox_lines_never_absorbed() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Gender: [ ] Male [ ] Female"]);

        assert!(TermsRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_title_taken_from_first_clause() {
        let title = derive_title("I authorize the release of my records. Second sentence.");
        assert_eq!(title, "I authorize the release of my records");
    }
}
