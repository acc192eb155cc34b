//! Line recognizers, tried in priority order by the classifier loop.
//!
//! Each recognizer inspects a bounded window starting at the current line
//! and either claims some lines (returning candidates and a consumed count)
//! or declines. The fallback recognizer always claims, so the scan always
//! advances.

pub mod checkbox;
pub mod composite;
pub mod conditions;
pub mod fallback;
pub mod orphan;
pub mod signature;
pub mod terms;
pub mod yes_no;

pub use checkbox::CheckboxGroupRecognizer;
pub use composite::CompositeLabelRecognizer;
pub use conditions::ConditionBlockRecognizer;
pub use fallback::FallbackRecognizer;
pub use orphan::OrphanCheckboxRecognizer;
pub use signature::SignatureRecognizer;
pub use terms::TermsRecognizer;
pub use yes_no::YesNoRecognizer;

use super::FieldCandidate;
use super::context::ParseContext;
use super::patterns::CHECKBOX;
use super::title::clean_option;
use crate::text::Line;

/// Result of a successful recognition.
#[derive(Debug)]
pub struct RecognizerMatch {
    /// Candidates produced, in document order. May be empty for lines that
    /// are consumed but yield no field (witness lines, empty titles).
    pub candidates: Vec<FieldCandidate>,

    /// Number of lines consumed, always at least one.
    pub consumed: usize,
}

impl RecognizerMatch {
    pub fn new(candidates: Vec<FieldCandidate>, consumed: usize) -> Self {
        Self {
            candidates,
            consumed: consumed.max(1),
        }
    }

    pub fn single(candidate: FieldCandidate, consumed: usize) -> Self {
        Self::new(vec![candidate], consumed)
    }

    /// Consume lines without emitting a field.
    pub fn swallow(consumed: usize) -> Self {
        Self::new(Vec::new(), consumed)
    }
}

/// A line (or line-group) recognizer strategy.
pub trait Recognizer {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Try to claim lines starting at `at`. Returns `None` to pass the
    /// line to the next recognizer in the chain.
    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch>;
}

/// The default recognizer chain, in priority order.
///
/// The grid detector sits ahead of the generic chain so checkbox grids in
/// medical/dental sections are not shredded into per-line fields.
pub fn default_chain() -> Vec<Box<dyn Recognizer>> {
    vec![
        Box::new(SignatureRecognizer),
        Box::new(super::grid::GridRecognizer),
        Box::new(ConditionBlockRecognizer),
        Box::new(CompositeLabelRecognizer),
        Box::new(OrphanCheckboxRecognizer),
        Box::new(CheckboxGroupRecognizer),
        Box::new(YesNoRecognizer),
        Box::new(TermsRecognizer),
        Box::new(FallbackRecognizer),
    ]
}

/// Option labels following each checkbox on a line, cleaned.
pub fn split_checkbox_labels(line: &str) -> Vec<String> {
    let boxes: Vec<_> = CHECKBOX.find_iter(line).collect();
    let mut labels = Vec::with_capacity(boxes.len());

    for (i, m) in boxes.iter().enumerate() {
        let end = boxes.get(i + 1).map(|n| n.start()).unwrap_or(line.len());
        let label = clean_option(&line[m.end()..end]);
        if !label.is_empty() {
            labels.push(label);
        }
    }

    labels
}

/// Whether a label set is exactly a Yes/No pair (either order).
pub fn is_pure_yes_no(labels: &[String]) -> bool {
    labels.len() == 2
        && labels
            .iter()
            .all(|l| l.eq_ignore_ascii_case("yes") || l.eq_ignore_ascii_case("no"))
        && !labels[0].eq_ignore_ascii_case(&labels[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_checkbox_labels() {
        let labels = split_checkbox_labels("Gender: [ ] Male [ ] Female [ ] Other");
        assert_eq!(labels, vec!["Male", "Female", "Other"]);
    }

    #[test]
    fn test_is_pure_yes_no() {
        assert!(is_pure_yes_no(&["Yes".into(), "No".into()]));
        assert!(is_pure_yes_no(&["No".into(), "Yes".into()]));
        assert!(!is_pure_yes_no(&["Yes".into(), "Maybe".into()]));
        assert!(!is_pure_yes_no(&["Yes".into(), "Yes".into()]));
    }
}
