//! Text intake: decoding, normalization, and structural scrubbing.

pub mod normalize;
pub mod scrub;

pub use normalize::normalize;
pub use scrub::scrub;

use crate::error::InputError;

/// A normalized document line.
///
/// `index` is the position in the original document, kept for diagnostics;
/// coalesced lines keep the index of their first physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub index: usize,
}

impl Line {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self {
            text: text.into(),
            index,
        }
    }

    /// Blank lines survive normalization as block delimiters.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Decode raw document bytes, falling back to Windows-1252 when the input
/// is not valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> Result<String, InputError> {
    if bytes.is_empty() {
        return Err(InputError::Empty);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
            if had_errors {
                Err(InputError::Decode(
                    "input is neither UTF-8 nor Windows-1252".to_string(),
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}
