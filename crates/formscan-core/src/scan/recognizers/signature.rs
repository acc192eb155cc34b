//! Signature and witness line recognition.

use super::{Recognizer, RecognizerMatch};
use crate::models::field::Control;
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{DATE_LABEL, SIGNATURE_LINE, WITNESS_LINE};
use crate::scan::title::infer_date_kind;
use crate::text::Line;

/// Recognizes signature lines, emitting the signature field once per
/// document plus an adjacent date field when one is labeled. Witness-only
/// lines are consumed and dropped.
pub struct SignatureRecognizer;

impl Recognizer for SignatureRecognizer {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let text = lines[at].text.trim();

        // Prose sentences mentioning a signature are not signature lines.
        if !is_signature_line(text) && !is_witness_line(text) {
            return None;
        }

        // Witness signatures are not the patient signature.
        if is_witness_line(text) {
            return Some(RecognizerMatch::swallow(1));
        }

        let mut candidates = Vec::new();
        let mut consumed = 1;

        if !ctx.signature_emitted {
            ctx.signature_emitted = true;
            candidates.push(FieldCandidate::with_key(
                "signature",
                "Signature",
                Control::Signature,
                ctx,
                lines[at].index,
            ));
        }

        // "Signature ______ Date ______" on one line.
        let lower = text.to_lowercase();
        let inline_date = lower.contains("date");

        // Or a date label on the following line.
        let next_date = lines
            .get(at + 1)
            .filter(|l| DATE_LABEL.is_match(l.text.trim()))
            .is_some();

        if inline_date || next_date {
            candidates.push(FieldCandidate::new(
                "Date",
                Control::Date {
                    input_type: infer_date_kind("date"),
                },
                ctx,
                lines[at].index,
            ));
            if next_date {
                consumed = 2;
            }
        }

        Some(RecognizerMatch::new(candidates, consumed))
    }
}

/// A line that IS a signature line, as opposed to prose that mentions
/// signatures: short, or carrying a fill-in run.
pub fn is_signature_line(text: &str) -> bool {
    SIGNATURE_LINE.is_match(text) && (text.len() <= 100 || text.contains("___"))
}

fn is_witness_line(text: &str) -> bool {
    WITNESS_LINE.is_match(text) && (text.len() <= 100 || text.contains("___"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;
    use crate::models::field::DateKind;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::new(*t, i))
            .collect()
    }

    #[test]
    fn test_signature_with_inline_date() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Patient Signature: ____________ Date: ________"]);

        let m = SignatureRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.candidates.len(), 2);
        assert_eq!(m.candidates[0].key, "signature");
        assert!(matches!(m.candidates[0].control, Control::Signature));
        assert!(matches!(
            m.candidates[1].control,
            Control::Date {
                input_type: DateKind::Past
            }
        ));
    }

    #[test]
    fn test_signature_emitted_once() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Signature: ______", "Signature of Guardian: ______"]);

        let first = SignatureRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(first.candidates.len(), 1);

        let second = SignatureRecognizer.try_match(&lines, 1, &mut ctx).unwrap();
        assert!(second.candidates.is_empty());
    }

    #[test]
    fn test_witness_line_dropped() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Witness Signature: ____________"]);

        let m = SignatureRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert!(m.candidates.is_empty());
        assert!(!ctx.signature_emitted);
    }

    #[test]
    fn test_prose_mentioning_signature_declines() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&[
            "I understand that my signature below authorizes the release of any records \
             needed to process insurance claims on my behalf.",
        ]);

        assert!(SignatureRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_date_label_on_next_line() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Signature: ____________", "Date: ____________"]);

        let m = SignatureRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 2);
        assert_eq!(m.candidates.len(), 2);
    }
}
