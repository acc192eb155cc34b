//! Medical/dental condition block harvesting.

use super::{Recognizer, RecognizerMatch, split_checkbox_labels};
use crate::models::field::{Choice, Control};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{BULLET, CONDITION_QUESTION, YES_NO_COMPOUND, checkbox_count};
use crate::scan::section::looks_like_heading;
use crate::scan::title::{clean_option, clean_title};
use crate::text::Line;

/// Recognizes a condition question ("Have you ever had ...") inside a
/// medical/dental section and harvests the Yes/No prompts and checkbox
/// options that follow it into one multi-select field.
pub struct ConditionBlockRecognizer;

impl Recognizer for ConditionBlockRecognizer {
    fn name(&self) -> &'static str {
        "condition_block"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        if !ctx.section.is_medical_like() {
            return None;
        }

        let opener = lines[at].text.trim();
        if !CONDITION_QUESTION.is_match(opener) {
            return None;
        }

        let mut options: Vec<String> = Vec::new();
        let mut harvested = 0;

        for line in &lines[at + 1..] {
            if line.is_blank() || looks_like_heading(&line.text) {
                break;
            }
            let text = line.text.trim();

            if let Some(caps) = YES_NO_COMPOUND.captures(text) {
                // "Diabetes [ ] Yes [ ] No" rows contribute the prompt.
                let prompt = clean_option(&caps[1]);
                if !prompt.is_empty() {
                    options.push(prompt);
                }
            } else if checkbox_count(text) > 0 {
                options.extend(split_checkbox_labels(text));
            } else if BULLET.is_match(text) {
                let label = clean_option(BULLET.replace(text, "").as_ref());
                if !label.is_empty() {
                    options.push(label);
                }
            } else {
                break;
            }
            harvested += 1;
        }

        if options.len() < ctx.config.classify.condition_min_options {
            return None;
        }

        dedupe_in_order(&mut options);

        let title = clean_title(opener);
        let choices: Vec<Choice> = options.into_iter().map(Choice::tagged).collect();
        let candidate = FieldCandidate::new(
            &title,
            Control::Radio {
                options: choices,
                multi: true,
            },
            ctx,
            lines[at].index,
        );

        Some(RecognizerMatch::single(candidate, 1 + harvested))
    }
}

fn dedupe_in_order(options: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    options.retain(|o| seen.insert(o.to_lowercase()));
}
