//! Generic text-input fallback, the end of the recognizer chain.

use super::{Recognizer, RecognizerMatch};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::title::{clean_title, infer_control};
use crate::text::Line;

/// Turns any remaining non-blank line into a generic input field. Always
/// matches, so the scan always advances past unrecognized content.
pub struct FallbackRecognizer;

impl Recognizer for FallbackRecognizer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let title = clean_title(&lines[at].text);

        // Nothing usable survives cleanup: consume without emitting.
        if title.len() < 2 || !title.chars().any(|c| c.is_alphabetic()) {
            return Some(RecognizerMatch::swallow(1));
        }

        // Stray option residue from shredded checkbox rows.
        let lower = title.to_lowercase();
        if matches!(lower.as_str(), "yes" | "no" | "yes no" | "no yes") {
            return Some(RecognizerMatch::swallow(1));
        }

        let control = infer_control(&title);
        let mut candidate = FieldCandidate::new(&title, control, ctx, lines[at].index);
        candidate.optional =
            lower.contains("optional") || lower.contains("if applicable");

        Some(RecognizerMatch::single(candidate, 1))
    }
}
