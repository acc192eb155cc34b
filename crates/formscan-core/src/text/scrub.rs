//! Structural scrubbing: strips letterhead, repeated headers/footers, page
//! numbers, and boilerplate before classification.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::Line;
use crate::models::config::ScrubConfig;
use crate::scan::patterns::CHECKBOX;

lazy_static! {
    static ref PAGE_NUMBER: Regex =
        Regex::new(r"(?i)^\s*(?:-\s*)?(?:page\s*)?\d{1,3}(?:\s*(?:of|/)\s*\d{1,3})?(?:\s*-)?\s*$")
            .unwrap();

    static ref ZIP_CODE: Regex = Regex::new(r"\b\d{5}(?:-\d{4})?\b").unwrap();

    static ref BOILERPLATE: Regex = Regex::new(
        r"(?i)(?:continued\s+on\s+(?:next|reverse)|please\s+turn\s+over|for\s+office\s+use(?:\s+only)?|office\s+use\s+only|rev\.?\s*\d+[/\-]\d+|form\s*#\s*\w+)"
    )
    .unwrap();

    static ref UNDERSCORE_RUN: Regex = Regex::new(r"_{2,}").unwrap();
}

/// Keywords suggesting a practice letterhead / address block.
const ADDRESS_KEYWORDS: &[&str] = &[
    "suite", "ste.", "street", "st.", "avenue", "ave", "blvd", "boulevard", "drive", "dr.",
    "road", "rd.", "p.o. box", "fax", "tel", "phone", "www.", ".com", ".org", "@",
];

/// Remove structural noise from normalized lines.
///
/// Blocks are blank-line-delimited. Output keeps the blank delimiters so the
/// classifier can still see block boundaries.
pub fn scrub(lines: Vec<Line>, config: &ScrubConfig) -> Vec<Line> {
    let repeated = repeated_lines(&lines, config.repeat_threshold);

    let mut out = Vec::with_capacity(lines.len());
    let mut block: Vec<Line> = Vec::new();

    for line in lines {
        if line.is_blank() {
            flush_block(&mut out, std::mem::take(&mut block), &repeated, config);
            out.push(line);
        } else {
            block.push(line);
        }
    }
    flush_block(&mut out, block, &repeated, config);

    out
}

fn flush_block(out: &mut Vec<Line>, block: Vec<Line>, repeated: &[String], config: &ScrubConfig) {
    if block.is_empty() {
        return;
    }

    if is_address_block(&block, config) {
        debug!("dropping address block of {} lines", block.len());
        return;
    }

    for line in block {
        if should_drop_line(&line, repeated) {
            continue;
        }
        out.push(line);
    }
}

/// Trimmed contents of lines that repeat enough to be headers/footers.
fn repeated_lines(lines: &[Line], threshold: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for line in lines {
        let trimmed = line.text.trim();
        if trimmed.len() < 8 || trimmed.ends_with(':') || CHECKBOX.is_match(trimmed) {
            continue;
        }
        *counts.entry(trimmed).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, n)| *n >= threshold)
        .map(|(s, _)| s.to_string())
        .collect()
}

fn should_drop_line(line: &Line, repeated: &[String]) -> bool {
    let trimmed = line.text.trim();

    // Placeholder-only lines (underscore runs, dashes) carry no content.
    if !trimmed.chars().any(|c| c.is_alphanumeric()) {
        return true;
    }

    if PAGE_NUMBER.is_match(trimmed) {
        return true;
    }

    if BOILERPLATE.is_match(trimmed) {
        return true;
    }

    repeated.iter().any(|r| r == trimmed)
}

/// A business/address header: several short lines dense with address
/// keywords and free of form artifacts (checkboxes, blanks, labels).
fn is_address_block(block: &[Line], config: &ScrubConfig) -> bool {
    if block.len() < config.address_block_min_lines {
        return false;
    }

    for line in block {
        let trimmed = line.text.trim_end();
        if CHECKBOX.is_match(trimmed)
            || UNDERSCORE_RUN.is_match(trimmed)
            || trimmed.ends_with(':')
        {
            return false;
        }
    }

    let mut hits = 0;
    for line in block {
        let lower = line.text.to_lowercase();
        hits += ADDRESS_KEYWORDS
            .iter()
            .filter(|k| keyword_hit(&lower, k))
            .count();
        if ZIP_CODE.is_match(&line.text) {
            hits += 1;
        }
    }

    hits >= config.address_keyword_min
}

/// Dotted keywords ("st.", "p.o. box") match as substrings; bare words
/// match whole words only, so "ave" never fires inside "have".
fn keyword_hit(lower: &str, keyword: &str) -> bool {
    if keyword.chars().any(|c| !c.is_ascii_alphanumeric()) {
        lower.contains(keyword)
    } else {
        lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|w| w == keyword)
    }
}
