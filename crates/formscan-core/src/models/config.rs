//! Configuration structures for the parsing pipeline.
//!
//! The numeric defaults below are empirically tuned against a corpus of
//! scanned intake forms; treat them as starting points, not laws.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration for the formscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormScanConfig {
    /// Structural scrubbing configuration.
    pub scrub: ScrubConfig,

    /// Line classification configuration.
    pub classify: ClassifyConfig,

    /// Grid/table detection configuration.
    pub grid: GridConfig,

    /// Template catalog matching configuration.
    pub matching: MatchConfig,
}

/// Structural scrubber configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// A line repeating at least this many times is a header/footer.
    pub repeat_threshold: usize,

    /// Minimum address-keyword hits for a block to count as a business header.
    pub address_keyword_min: usize,

    /// Minimum block size (lines) for business-header removal.
    pub address_block_min_lines: usize,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            repeat_threshold: 3,
            address_keyword_min: 2,
            address_block_min_lines: 3,
        }
    }
}

/// Field classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Lookahead window (lines) for multi-line recognizers.
    pub lookahead: usize,

    /// Minimum harvested options for a condition block to become a field.
    pub condition_min_options: usize,

    /// Minimum character count for a paragraph run to become a terms field.
    pub terms_min_chars: usize,

    /// Minimum sentence terminators in a terms paragraph.
    pub terms_min_sentences: usize,

    /// Option count above which an inline checkbox group is multi-select.
    pub multi_select_threshold: usize,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            lookahead: 3,
            condition_min_options: 3,
            terms_min_chars: 250,
            terms_min_sentences: 2,
            multi_select_threshold: 4,
        }
    }
}

/// Grid/table detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Minimum checkboxes on a line to open a header-less grid.
    pub min_checkboxes: usize,

    /// Minimum character spacing between grid checkboxes.
    pub min_spacing: usize,

    /// Column clustering tolerance (characters).
    pub cluster_tolerance: usize,

    /// Header token / checkbox column alignment tolerance (characters).
    pub header_align_tolerance: usize,

    /// Fraction of sampled lines that must support a column cluster.
    pub min_support: f32,

    /// Relaxed support level allowing two-column grids.
    pub relaxed_support: f32,

    /// Lookahead window (lines) when sampling checkbox offsets.
    pub lookahead: usize,

    /// Minimum data rows for a header-less grid.
    pub min_rows: usize,

    /// Minimum data rows for a header-row table.
    pub min_table_rows: usize,

    /// Minimum unique options for a header-less grid.
    pub min_unique_options: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            min_checkboxes: 3,
            min_spacing: 8,
            cluster_tolerance: 3,
            header_align_tolerance: 15,
            min_support: 0.5,
            relaxed_support: 0.7,
            lookahead: 12,
            min_rows: 3,
            min_table_rows: 2,
            min_unique_options: 5,
        }
    }
}

/// Template catalog matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Fuzzy-match acceptance threshold.
    pub accept_threshold: f32,

    /// Relaxed acceptance threshold for patient/medical-adjacent sections.
    pub relaxed_threshold: f32,

    /// Scores at or above this (but below acceptance) are logged as near misses.
    pub near_miss_floor: f32,

    /// Token coverage required of templates with more than
    /// `long_title_tokens` tokens.
    pub coverage_long: f32,

    /// Token coverage required of short-titled templates.
    pub coverage_short: f32,

    /// Token count separating short from long template titles.
    pub long_title_tokens: usize,

    /// Option count at which a multi-select is a condition collector.
    pub collector_min_options: usize,

    /// Condition keyword hits at which a multi-select is a condition collector.
    pub collector_min_keywords: usize,

    /// Below this option overlap, an option-bearing template cannot absorb
    /// an option-bearing candidate in the exact tiers.
    pub min_option_overlap: f32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            accept_threshold: 0.85,
            relaxed_threshold: 0.82,
            near_miss_floor: 0.75,
            coverage_long: 0.8,
            coverage_short: 0.65,
            long_title_tokens: 3,
            collector_min_options: 8,
            collector_min_keywords: 3,
            min_option_overlap: 0.34,
        }
    }
}

impl FormScanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
