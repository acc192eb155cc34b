//! Error types for the formscan-core library.

use thiserror::Error;

/// Main error type for the formscan library.
#[derive(Error, Debug)]
pub enum FormScanError {
    /// Input decoding error.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Document parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Template catalog error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to reading and decoding input text.
#[derive(Error, Debug)]
pub enum InputError {
    /// The input document contained no usable text.
    #[error("document is empty")]
    Empty,

    /// The input bytes could not be decoded with any supported encoding.
    #[error("failed to decode input: {0}")]
    Decode(String),
}

/// Errors related to parsing a document into fields.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Nothing survived normalization and scrubbing.
    #[error("no content lines after scrubbing")]
    NoContent,

    /// An internal invariant was violated during the scan.
    #[error("internal parse failure: {0}")]
    Internal(String),
}

/// Errors related to the template catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog document is not valid JSON.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A template entry is malformed.
    #[error("bad template entry {key}: {reason}")]
    BadEntry { key: String, reason: String },

    /// An alias points at a key that does not exist in any category.
    #[error("alias {phrase:?} targets unknown key {key:?}")]
    DanglingAlias { phrase: String, key: String },

    /// Two template entries share a key.
    #[error("duplicate template key: {0}")]
    DuplicateKey(String),
}

/// Result type for the formscan library.
pub type Result<T> = std::result::Result<T, FormScanError>;
