//! Compound Yes/No extraction with conditional detail fields.

use super::{Recognizer, RecognizerMatch};
use crate::models::field::{Choice, Control, FieldCondition, InputKind};
use crate::scan::FieldCandidate;
use crate::scan::context::ParseContext;
use crate::scan::patterns::{GUIDANCE, NO_YES_COMPOUND, YES_NO_COMPOUND, checkbox_count};
use crate::scan::title::clean_title;
use crate::text::Line;

/// Recognizes "`<prompt>` [ ] Yes [ ] No" lines as boolean radio fields.
///
/// The prompt may sit on the same line as the checkbox pair or on the line
/// above a bare pair. A guidance phrase on the same or the following line
/// ("if yes, please explain") adds a text field revealed by the
/// affirmative answer.
pub struct YesNoRecognizer;

impl Recognizer for YesNoRecognizer {
    fn name(&self) -> &'static str {
        "yes_no"
    }

    fn try_match(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let text = lines[at].text.trim();

        if checkbox_count(text) == 0 {
            return self.match_prompt_then_pair(lines, at, ctx);
        }

        let (prompt_raw, tail) = match_compound(text)?;
        let tail = tail.to_string();

        let title = if prompt_raw.trim().is_empty() {
            // Bare pair: the prompt is the line above, when one exists.
            let prev = at.checked_sub(1).map(|i| &lines[i])?;
            if prev.is_blank() || checkbox_count(&prev.text) > 0 {
                return None;
            }
            clean_title(&prev.text)
        } else {
            clean_title(prompt_raw)
        };

        if title.is_empty() {
            return None;
        }

        Some(emit(lines, at, 1, &title, lines[at].index, &tail, ctx))
    }
}

impl YesNoRecognizer {
    /// Prompt line directly above a bare "[ ] Yes [ ] No" row.
    fn match_prompt_then_pair(
        &self,
        lines: &[Line],
        at: usize,
        ctx: &mut ParseContext<'_>,
    ) -> Option<RecognizerMatch> {
        let text = lines[at].text.trim();
        if text.is_empty() || text.len() > 160 {
            return None;
        }

        let next = lines.get(at + 1)?;
        let (prompt, tail) = match_compound(next.text.trim())?;
        if !prompt.trim().is_empty() {
            return None;
        }
        let tail = tail.to_string();

        let title = clean_title(text);
        if title.is_empty() {
            return None;
        }

        Some(emit(lines, at + 1, 2, &title, lines[at].index, &tail, ctx))
    }
}

/// Build the boolean radio plus any conditional detail field.
///
/// `pair_at` is the index of the line holding the checkbox pair; guidance
/// is searched on its tail and on the line after it.
fn emit(
    lines: &[Line],
    pair_at: usize,
    mut consumed: usize,
    title: &str,
    title_line: usize,
    tail: &str,
    ctx: &mut ParseContext<'_>,
) -> RecognizerMatch {
    let parent = FieldCandidate::new(
        title,
        Control::Radio {
            options: vec![Choice::yes(), Choice::no()],
            multi: false,
        },
        ctx,
        title_line,
    );
    let parent_key = parent.key.clone();
    let mut candidates = vec![parent];

    let mut guidance: Option<String> = GUIDANCE
        .is_match(tail)
        .then(|| clean_title(tail))
        .filter(|t| !t.is_empty());

    if guidance.is_none() {
        if let Some(next) = lines.get(pair_at + 1) {
            let next_text = next.text.trim();
            if checkbox_count(next_text) == 0 && GUIDANCE.is_match(next_text) {
                let cleaned = clean_title(next_text);
                if !cleaned.is_empty() {
                    guidance = Some(cleaned);
                    consumed += 1;
                }
            }
        }
    }

    if let Some(guidance_title) = guidance {
        let mut detail = FieldCandidate::new(
            &guidance_title,
            Control::Input {
                input_type: InputKind::Text,
            },
            ctx,
            lines[pair_at].index,
        );
        detail.optional = true;
        detail.condition = Some(FieldCondition {
            key: parent_key,
            value: true,
        });
        candidates.push(detail);
    }

    RecognizerMatch::new(candidates, consumed)
}

/// Match either Yes/No order, returning the prompt and the text after the
/// second checkbox label.
fn match_compound(text: &str) -> Option<(&str, &str)> {
    for pattern in [&*YES_NO_COMPOUND, &*NO_YES_COMPOUND] {
        if let Some(caps) = pattern.captures(text) {
            let prompt = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let tail = &text[caps.get(0).map(|m| m.end()).unwrap_or(text.len())..];
            return Some((prompt, tail));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::FormScanConfig;
    use crate::models::field::ChoiceValue;

    fn lines(texts: &[&str]) -> Vec<Line> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Line::new(*t, i))
            .collect()
    }

    #[test]
    fn test_plain_yes_no() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Do you smoke? [ ] Yes [ ] No"]);

        let m = YesNoRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.candidates.len(), 1);

        let candidate = &m.candidates[0];
        assert_eq!(candidate.title, "Do you smoke?");
        let options = candidate.control.options().unwrap();
        assert_eq!(options[0].name, "Yes");
        assert_eq!(options[0].value, ChoiceValue::Bool(true));
        assert_eq!(options[1].name, "No");
        assert_eq!(options[1].value, ChoiceValue::Bool(false));
    }

    #[test]
    fn test_guidance_on_next_line() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Do you smoke? [ ] Yes [ ] No", "If yes, please explain"]);

        let m = YesNoRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 2);
        assert_eq!(m.candidates.len(), 2);

        let detail = &m.candidates[1];
        assert_eq!(detail.condition.as_ref().unwrap().key, m.candidates[0].key);
        assert!(detail.condition.as_ref().unwrap().value);
        assert!(detail.optional);
    }

    #[test]
    fn test_guidance_inline() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&[
            "Are you allergic to latex? [ ] Yes [ ] No if yes, please explain",
        ]);

        let m = YesNoRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 1);
        assert_eq!(m.candidates.len(), 2);
    }

    #[test]
    fn test_reversed_no_yes_order() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Is this your first visit? [ ] No [ ] Yes"]);

        let m = YesNoRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        let options = m.candidates[0].control.options().unwrap();
        assert_eq!(options[0].value, ChoiceValue::Bool(true));
    }

    #[test]
    fn test_prompt_line_above_bare_pair() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&[
            "Have you been hospitalized in the last year?",
            "[ ] Yes [ ] No",
            "If so, please explain",
        ]);

        let m = YesNoRecognizer.try_match(&lines, 0, &mut ctx).unwrap();
        assert_eq!(m.consumed, 3);
        assert_eq!(m.candidates.len(), 2);
        assert_eq!(
            m.candidates[0].title,
            "Have you been hospitalized in the last year?"
        );
    }

    #[test]
    fn test_non_yes_no_declines() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Gender: [ ] Male [ ] Female"]);

        assert!(YesNoRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }

    #[test]
    fn test_plain_text_line_declines() {
        let config = FormScanConfig::default();
        let mut ctx = ParseContext::new(&config);
        let lines = lines(&["Emergency contact name", "Emergency contact phone"]);

        assert!(YesNoRecognizer.try_match(&lines, 0, &mut ctx).is_none());
    }
}
