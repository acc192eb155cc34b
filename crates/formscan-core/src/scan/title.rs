//! Title cleanup, key derivation, and control sub-typing.

use lazy_static::lazy_static;
use regex::Regex;

use super::patterns::{CHECKBOX, DATE_PLACEHOLDER, TRAILING_FILL};
use crate::models::field::{Control, DateKind, InputKind};

lazy_static! {
    static ref PAREN_FORMAT_HINT: Regex =
        Regex::new(r"(?i)\(\s*(?:mm|dd|yy)[a-z/ \-]*\)").unwrap();
    static ref MULTI_SPACE: Regex = Regex::new(r"\s{2,}").unwrap();
    static ref LEADING_NOISE: Regex = Regex::new(r"^[\s\-*:,.]+").unwrap();
    static ref WORD: Regex = Regex::new(r"[A-Za-z0-9']+").unwrap();
}

/// Fixed table of OCR letter confusions observed in scanned forms.
const OCR_CONFUSIONS: &[(&str, &str)] = &[
    ("narne", "name"),
    ("ernail", "email"),
    ("e-rnail", "e-mail"),
    ("adclress", "address"),
    ("aclclress", "address"),
    ("lnsurance", "insurance"),
    ("lnsured", "insured"),
    ("lnitial", "initial"),
    ("lnitials", "initials"),
    ("phane", "phone"),
    ("0ate", "date"),
    ("oate", "date"),
    ("slgnature", "signature"),
    ("signaturc", "signature"),
    ("rnedical", "medical"),
    ("rnedications", "medications"),
];

/// Clean a raw line fragment into a display title.
///
/// Strips checkbox markers, trailing colons and fill-in artifacts, and
/// corrects known OCR letter confusions.
pub fn clean_title(raw: &str) -> String {
    let text = CHECKBOX.replace_all(raw, " ");
    let text = DATE_PLACEHOLDER.replace_all(&text, " ");
    let text = PAREN_FORMAT_HINT.replace_all(&text, " ");
    let text = TRAILING_FILL.replace_all(&text, "");
    let text = LEADING_NOISE.replace_all(&text, "");
    let text = MULTI_SPACE.replace_all(&text, " ");

    fix_ocr_confusions(text.trim())
}

/// Clean an option label: title cleanup plus adjacent-duplicate collapse.
pub fn clean_option(raw: &str) -> String {
    collapse_duplicate_words(&clean_title(raw))
}

/// Collapse duplicate adjacent words, a common OCR doubling artifact.
pub fn collapse_duplicate_words(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if out
            .last()
            .map(|prev| prev.eq_ignore_ascii_case(word))
            .unwrap_or(false)
        {
            continue;
        }
        out.push(word);
    }
    out.join(" ")
}

/// Apply the fixed OCR letter-confusion table, word by word,
/// preserving the original capitalization of the first letter.
pub fn fix_ocr_confusions(text: &str) -> String {
    WORD.replace_all(text, |caps: &regex::Captures<'_>| {
        let word = &caps[0];
        let lower = word.to_lowercase();
        for (wrong, right) in OCR_CONFUSIONS {
            if lower == *wrong {
                return match_case(right, word);
            }
        }
        word.to_string()
    })
    .into_owned()
}

fn match_case(replacement: &str, original: &str) -> String {
    let upper_first = original.chars().next().map(|c| c.is_uppercase()).unwrap_or(false);
    if original.chars().all(|c| !c.is_lowercase()) && original.len() > 1 {
        return replacement.to_uppercase();
    }
    if upper_first {
        let mut chars = replacement.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    } else {
        replacement.to_string()
    }
}

/// Derive a key slug from a display title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_underscore = true;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            slug.push('_');
            last_underscore = true;
        }
    }

    while slug.ends_with('_') {
        slug.pop();
    }

    // Long question titles make unwieldy keys.
    let mut parts: Vec<&str> = slug.split('_').filter(|p| !p.is_empty()).collect();
    parts.truncate(8);
    parts.join("_")
}

/// Infer the control for a plain (non-option) field from its cleaned title.
pub fn infer_control(title: &str) -> Control {
    let lower = title.to_lowercase();

    if has_word(&lower, "date") || lower.contains("birth") || has_word(&lower, "dob") {
        return Control::Date {
            input_type: infer_date_kind(&lower),
        };
    }

    if has_word(&lower, "state") && !lower.contains("statement") {
        return Control::States;
    }

    Control::Input {
        input_type: infer_input_kind(&lower),
    }
}

/// Input subtype by keyword search over the cleaned, lowercased title.
pub fn infer_input_kind(lower: &str) -> InputKind {
    if lower.contains("email") || lower.contains("e-mail") {
        InputKind::Email
    } else if lower.contains("phone")
        || has_word(lower, "cell")
        || has_word(lower, "mobile")
        || has_word(lower, "fax")
    {
        InputKind::Phone
    } else if lower.contains("social security") || has_word(lower, "ssn") || lower.contains("ss#") {
        InputKind::Ssn
    } else if has_word(lower, "zip") || lower.contains("postal code") {
        InputKind::Zip
    } else if has_word(lower, "initials") || has_word(lower, "initial") {
        InputKind::Initials
    } else if has_word(lower, "age")
        || lower.contains("how many")
        || lower.contains("number of")
        || lower.contains('#')
        || has_word(lower, "weight")
        || has_word(lower, "height")
    {
        InputKind::Number
    } else if has_word(lower, "name") {
        InputKind::Name
    } else {
        InputKind::Text
    }
}

/// Past/future date subtype: appointment-like dates open forward, the rest
/// (birth dates, signature dates, onset dates) open backward.
pub fn infer_date_kind(lower: &str) -> DateKind {
    const FUTURE: &[&str] = &["appointment", "due", "next visit", "expir", "renewal", "follow-up", "follow up"];
    if FUTURE.iter().any(|k| lower.contains(k)) {
        DateKind::Future
    } else {
        DateKind::Past
    }
}

/// Whole-word containment on a lowercased haystack.
pub fn has_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|w| w == word)
}

/// Normalize a title or option name for matching: lowercase, alphanumeric
/// words only, single spaces.
pub fn normalize_for_match(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;

    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}
