//! Glyph, whitespace, and line-wrap normalization for OCR text.

use lazy_static::lazy_static;
use regex::Regex;

use super::Line;

lazy_static! {
    // Parenthesis-style checkboxes, canonicalized alongside the glyph forms.
    static ref PAREN_BOX_EMPTY: Regex = Regex::new(r"\(\s{0,2}\)").unwrap();
    static ref PAREN_BOX_CHECKED: Regex = Regex::new(r"\(\s*[xX✓✔]\s*\)").unwrap();

    // Runs of three or more single letters separated by single spaces, the
    // classic OCR letter-spacing artifact ("P a t i e n t").
    static ref SPACED_LETTERS: Regex = Regex::new(r"\b[A-Za-z](?: [A-Za-z]){2,}\b").unwrap();

    // A line ending in a Yes/No checkbox pair.
    static ref TRAILING_YES_NO: Regex =
        Regex::new(r"(?i)\[\s*x?\s*\]\s*(?:yes|no)\.?\s*$").unwrap();
}

/// Short connector words that signal a soft-wrapped continuation.
const CONNECTORS: &[&str] = &[
    "and", "or", "of", "to", "with", "for", "if", "in", "on", "at", "by", "per", "the", "a", "an",
];

/// Normalize raw document text into lines ready for scrubbing.
///
/// Interior spacing is preserved: the grid detector depends on character
/// offsets staying stable across rows.
pub fn normalize(text: &str) -> Vec<Line> {
    let lines: Vec<String> = text
        .lines()
        .map(|l| collapse_spaced_letters(&normalize_glyphs(l)))
        .map(|l| l.trim_end().to_string())
        .collect();

    coalesce(lines)
}

/// Replace Unicode checkbox/bullet glyphs and typographic punctuation with
/// a canonical ASCII-like token set.
pub fn normalize_glyphs(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);

    for ch in line.chars() {
        match ch {
            // Empty checkboxes.
            '☐' | '□' | '◻' | '❏' | '❑' | '⬜' | '▢' => out.push_str("[ ]"),
            // Checked checkboxes.
            '☑' | '☒' | '■' | '◼' | '▣' | '⬛' => out.push_str("[x]"),
            // Bullet markers.
            '•' | '▪' | '‣' | '◦' | '·' | '●' | '○' => out.push('-'),
            // Typographic punctuation.
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            // Exotic spaces.
            '\u{00a0}' | '\u{2007}' | '\u{2009}' | '\u{200a}' | '\u{202f}' => out.push(' '),
            '\u{200b}' | '\u{feff}' => {}
            _ => out.push(ch),
        }
    }

    let out = PAREN_BOX_CHECKED.replace_all(&out, "[x]");
    let out = PAREN_BOX_EMPTY.replace_all(&out, "[ ]");
    out.into_owned()
}

/// Rejoin OCR-spaced single letters into words.
///
/// Only runs of three or more letters are collapsed; a wider gap between
/// letters breaks the run, preserving genuine word boundaries.
pub fn collapse_spaced_letters(line: &str) -> String {
    SPACED_LETTERS
        .replace_all(line, |caps: &regex::Captures<'_>| {
            caps[0].replace(' ', "")
        })
        .into_owned()
}

/// Coalesce soft-wrapped lines back into logical lines.
fn coalesce(lines: Vec<String>) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len());

    for (index, line) in lines.into_iter().enumerate() {
        let Some(prev) = out.last_mut() else {
            out.push(Line::new(line, index));
            continue;
        };

        if prev.is_blank() || line.trim().is_empty() {
            out.push(Line::new(line, index));
            continue;
        }

        if should_join(&prev.text, &line) {
            join_into(&mut prev.text, &line);
        } else {
            out.push(Line::new(line, index));
        }
    }

    out
}

/// Decide whether `next` is a soft-wrapped continuation of `prev`.
fn should_join(prev: &str, next: &str) -> bool {
    let prev_trim = prev.trim_end();
    let next_trim = next.trim_start();
    if prev_trim.is_empty() || next_trim.is_empty() {
        return false;
    }

    // Hyphen/slash wraps always continue.
    if prev_trim.ends_with('-') || prev_trim.ends_with('/') {
        return true;
    }

    let next_first = next_trim.chars().next().unwrap_or(' ');
    let starts_lower = next_first.is_lowercase();
    let starts_paren = next_first == '(';
    let first_word: String = next_trim
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect::<String>()
        .to_lowercase();
    let starts_connector = CONNECTORS.contains(&first_word.as_str());

    // A trailing Yes/No pair followed by lowercase text is a wrapped
    // guidance phrase ("if yes, please explain...").
    if TRAILING_YES_NO.is_match(prev_trim) {
        return starts_lower;
    }

    let last = prev_trim.chars().last().unwrap_or(' ');
    let terminal = matches!(last, '.' | '!' | '?' | ':' | ';');

    !terminal && (starts_lower || starts_connector || starts_paren)
}

fn join_into(prev: &mut String, next: &str) {
    let next = next.trim_start();
    while prev.ends_with(' ') {
        prev.pop();
    }

    if prev.ends_with('-') {
        prev.pop();
        prev.push_str(next);
    } else if prev.ends_with('/') {
        prev.push_str(next);
    } else {
        prev.push(' ');
        prev.push_str(next);
    }
}
