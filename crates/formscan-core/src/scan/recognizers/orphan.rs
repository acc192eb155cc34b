//! Orphaned checkbox/label association.
//!
//! Some forms render a row of bare checkboxes with their labels on the
//! following line. The two lines are paired positionally.

use super::{Recognizer, RecognizerMatch, is_pure_yes_no};
use crate::models::field::{Choice, Control};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{CHECKBOX, WIDE_GAP, checkbox_count};
use crate::scan::section::looks_like_heading;
use crate::scan::title::{clean_option, clean_title};
use crate::text::Line;

/// Recognizes a bare checkbox row followed by a delimiter-separated label
/// row, pairing them into one multi-select field. Also claims the label
/// line ahead of the pair when the pattern starts with a title line.
pub struct OrphanCheckboxRecognizer;

impl Recognizer for OrphanCheckboxRecognizer {
    fn name(&self) -> &'static str {
        "orphan_checkboxes"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        // Title line directly ahead of the checkbox/label pair.
        if is_title_line(&lines[at].text) {
            let boxes = lines.get(at + 1)?;
            let labels = lines.get(at + 2)?;
            let paired = pair(&boxes.text, &labels.text)?;
            let title = clean_title(&lines[at].text);
            if title.is_empty() {
                return None;
            }
            return Some(RecognizerMatch::single(
                build(&title, paired, ctx, lines[at].index),
                3,
            ));
        }

        // Checkbox row first; fall back to the preceding line for a title.
        let labels = lines.get(at + 1)?;
        let paired = pair(&lines[at].text, &labels.text)?;

        let title = at
            .checked_sub(1)
            .map(|i| &lines[i])
            .filter(|l| !l.is_blank() && !looks_like_heading(&l.text) && checkbox_count(&l.text) == 0)
            .map(|l| clean_title(&l.text))
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Options".to_string());

        Some(RecognizerMatch::single(
            build(&title, paired, ctx, lines[at].index),
            2,
        ))
    }
}

fn is_title_line(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && trimmed.len() <= 80
        && checkbox_count(trimmed) == 0
        && !looks_like_heading(trimmed)
        && !trimmed.ends_with('.')
}

/// Pair a bare checkbox row with a label row; `None` when either line does
/// not fit the pattern.
fn pair(box_line: &str, label_line: &str) -> Option<Vec<String>> {
    let boxes = checkbox_count(box_line);
    if boxes < 2 {
        return None;
    }

    // "Almost no adjacent text" on the checkbox row.
    let residue: String = CHECKBOX
        .replace_all(box_line, "")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if residue.len() >= 4 {
        return None;
    }

    if label_line.trim().is_empty() || checkbox_count(label_line) > 0 {
        return None;
    }

    let labels = split_labels(label_line);
    if labels.len() < 2 || is_pure_yes_no(&labels) {
        return None;
    }

    Some(labels.into_iter().take(boxes).collect())
}

fn split_labels(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let parts: Vec<String> = if trimmed.contains(',') {
        trimmed.split(',').map(clean_option).collect()
    } else {
        WIDE_GAP.split(trimmed).map(clean_option).collect()
    };
    parts.into_iter().filter(|p| !p.is_empty()).collect()
}

fn build(title: &str, labels: Vec<String>, ctx: &mut ParseContext<'_>, line: usize) -> FieldCandidate {
    let options: Vec<Choice> = labels.into_iter().map(Choice::tagged).collect();
    let multi = options.len() > ctx.config.classify.multi_select_threshold;
    FieldCandidate::new(
        title,
        Control::Radio { options, multi },
        ctx,
        line,
    )
}
