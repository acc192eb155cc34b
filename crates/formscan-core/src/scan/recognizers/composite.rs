//! Composite multi-label line splitting ("Height: ___ Weight: ___").

use super::{Recognizer, RecognizerMatch};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{CHECKBOX, LABEL_VALUE, SENTENCE_LIKE};
use crate::scan::title::{clean_title, infer_control};
use crate::text::Line;

/// Recognizes a single line carrying several "Label: value-area" pairs and
/// splits it into one independently typed field per label.
pub struct CompositeLabelRecognizer;

impl Recognizer for CompositeLabelRecognizer {
    fn name(&self) -> &'static str {
        "composite_labels"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let text = lines[at].text.trim();

        if text.contains('?') || CHECKBOX.is_match(text) || SENTENCE_LIKE.is_match(text) {
            return None;
        }

        let captures: Vec<regex::Match<'_>> = LABEL_VALUE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .collect();
        if captures.len() < 2 {
            return None;
        }

        // The areas between labels must be fill-ins, not prose.
        for pair in captures.windows(2) {
            let between = &text[pair[0].end()..pair[1].start()];
            if word_count(between) > 4 {
                return None;
            }
        }

        let candidates: Vec<FieldCandidate> = captures
            .iter()
            .map(|m| {
                let title = clean_title(m.as_str());
                let control = infer_control(&title);
                FieldCandidate::new(&title, control, ctx, lines[at].index)
            })
            .collect();

        Some(RecognizerMatch::new(candidates, 1))
    }
}

fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphabetic()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;
    use crate::models::field::{Control, InputKind};

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::new(*t, i))
            .collect()
    }

    #[test]
    fn test_splits_multiple_labels() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["City: ____________ State: ____ Zip: ________"]);

        let m = CompositeLabelRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.candidates.len(), 3);
        assert_eq!(m.candidates[0].title, "City");
        assert!(matches!(m.candidates[1].control, Control::States));
        assert!(matches!(
            m.candidates[2].control,
            Control::Input {
                input_type: InputKind::Zip
            }
        ));
    }

    #[test]
    fn test_single_label_declines() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Comments: ____________"]);

        assert!(CompositeLabelRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_question_lines_decline() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Who referred you? Name: ______ Phone: ______"]);

        assert!(CompositeLabelRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_sentences_decline() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&[
            "Please provide the following: Name: the person responsible for this account Phone: as above",
        ]);

        assert!(CompositeLabelRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }
}
