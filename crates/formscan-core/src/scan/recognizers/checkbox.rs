//! Inline checkbox option harvesting.

use super::{Recognizer, RecognizerMatch, is_pure_yes_no, split_checkbox_labels};
use crate::models::field::{Choice, Control};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{BULLET, CHECKBOX, checkbox_count};
use crate::scan::section::looks_like_heading;
use crate::scan::title::clean_title;
use crate::text::Line;

/// Recognizes checkbox+label groups: options on the current line plus any
/// immediately following checkbox or bullet lines. The question title is
/// the text ahead of the first checkbox, or the line directly above the
/// group when that text is unusable.
pub struct CheckboxGroupRecognizer;

impl Recognizer for CheckboxGroupRecognizer {
    fn name(&self) -> &'static str {
        "checkbox_group"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let text = &lines[at].text;

        if checkbox_count(text) > 0 {
            let prefix = CHECKBOX.find(text).map(|m| &text[..m.start()]).unwrap_or("");
            let title = clean_title(prefix);
            let (mut options, harvested) = harvest(lines, at);
            if options.is_empty() || is_pure_yes_no(&options) {
                return None;
            }
            dedupe(&mut options);

            let title = if usable(&title) {
                title
            } else {
                preceding_title(lines, at).unwrap_or_else(|| "Options".to_string())
            };

            return Some(RecognizerMatch::single(
                build(&title, options, ctx, lines[at].index),
                harvested,
            ));
        }

        // Title line directly above a checkbox-led group.
        let next = lines.get(at + 1)?;
        if !starts_with_checkbox(&next.text) {
            return None;
        }
        let trimmed = text.trim();
        if trimmed.is_empty()
            || trimmed.len() > 100
            || looks_like_heading(trimmed)
            || trimmed.ends_with('.')
        {
            return None;
        }

        let (mut options, harvested) = harvest(lines, at + 1);
        if options.len() < 2 || is_pure_yes_no(&options) {
            return None;
        }
        dedupe(&mut options);

        let title = clean_title(trimmed);
        if !usable(&title) {
            return None;
        }

        Some(RecognizerMatch::single(
            build(&title, options, ctx, lines[at].index),
            1 + harvested,
        ))
    }
}

/// Collect option labels from the line at `start` and any contiguous
/// checkbox/bullet lines after it.
fn harvest(lines: &[Line], start: usize) -> (Vec<String>, usize) {
    let mut options = split_checkbox_labels(&lines[start].text);
    let mut consumed = 1;

    for line in &lines[start + 1..] {
        if line.is_blank() || looks_like_heading(&line.text) {
            break;
        }
        let text = line.text.trim();
        if checkbox_count(text) > 0 {
            options.extend(split_checkbox_labels(text));
        } else if BULLET.is_match(text) {
            let label = clean_title(BULLET.replace(text, "").as_ref());
            if !label.is_empty() {
                options.push(label);
            }
        } else {
            break;
        }
        consumed += 1;
    }

    (options, consumed)
}

fn dedupe(options: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    options.retain(|o| seen.insert(o.to_lowercase()));
}

fn usable(title: &str) -> bool {
    title.len() >= 2 && title.chars().any(|c| c.is_alphabetic())
}

fn starts_with_checkbox(text: &str) -> bool {
    CHECKBOX
        .find(text)
        .map(|m| text[..m.start()].trim().is_empty())
        .unwrap_or(false)
}

fn preceding_title(lines: &[Line], at: usize) -> Option<String> {
    let prev = lines.get(at.checked_sub(1)?)?;
    if prev.is_blank() || looks_like_heading(&prev.text) || checkbox_count(&prev.text) > 0 {
        return None;
    }
    let title = clean_title(&prev.text);
    usable(&title).then_some(title)
}

fn build(title: &str, labels: Vec<String>, ctx: &mut ParseContext<'_>, line: usize) -> FieldCandidate {
    let lower = title.to_lowercase();
    let multi = labels.len() > ctx.config.classify.multi_select_threshold
        || lower.contains("all that apply")
        || lower.contains("select all")
        || lower.contains("check all");

    let options: Vec<Choice> = labels.into_iter().map(Choice::tagged).collect();
    FieldCandidate::new(title, Control::Radio { options, multi }, ctx, line)
}
