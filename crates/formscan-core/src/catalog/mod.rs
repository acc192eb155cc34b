//! The template catalog: canonical field definitions loaded once from a
//! JSON dictionary and immutable afterwards.

pub mod matcher;

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{CatalogError, FormScanError};
use crate::models::field::Field;
use crate::scan::title::normalize_for_match;

/// The default dictionary compiled into the binary.
const EMBEDDED_CATALOG: &str = include_str!("../../assets/templates.json");

/// Reserved top-level key holding the alias map.
const ALIASES_KEY: &str = "aliases";

/// One canonical field definition, with matching data precomputed at load.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    /// The canonical field shape adopted by matched candidates.
    pub field: Field,

    /// Category the entry was listed under.
    pub category: String,

    norm_title: String,
    title_tokens: Vec<String>,
    option_names: Vec<String>,
}

impl TemplateEntry {
    fn new(field: Field, category: String) -> Self {
        let norm_title = normalize_for_match(&field.title);
        let title_tokens = norm_title.split(' ').map(str::to_string).filter(|t| !t.is_empty()).collect();
        let option_names = field
            .control
            .options()
            .map(|options| {
                options
                    .iter()
                    .map(|o| normalize_for_match(&o.name))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            field,
            category,
            norm_title,
            title_tokens,
            option_names,
        }
    }

    /// Normalized title.
    pub fn norm_title(&self) -> &str {
        &self.norm_title
    }

    /// Normalized title tokens.
    pub fn title_tokens(&self) -> &[String] {
        &self.title_tokens
    }

    /// Normalized option names, empty for non-option controls.
    pub fn option_names(&self) -> &[String] {
        &self.option_names
    }
}

/// The loaded catalog. Never mutated after load, so a single instance is
/// shared freely across worker threads.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    entries: Vec<TemplateEntry>,
    by_key: HashMap<String, usize>,
    /// (normalized phrase, entry index), in phrase order.
    aliases: Vec<(String, usize)>,
}

impl TemplateCatalog {
    /// Load the embedded default dictionary.
    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load a dictionary from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, FormScanError> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    /// Parse a dictionary document: category name → ordered template list,
    /// plus the reserved `aliases` key.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let root: Value = serde_json::from_str(json)?;
        let Some(object) = root.as_object() else {
            return Err(CatalogError::BadEntry {
                key: "<root>".to_string(),
                reason: "catalog root must be an object".to_string(),
            });
        };

        let mut catalog = Self::default();

        for (category, value) in object {
            if category == ALIASES_KEY {
                continue;
            }
            let fields: Vec<Field> = serde_json::from_value(value.clone())?;
            for field in fields {
                let key = field.key.clone();
                if key.is_empty() {
                    return Err(CatalogError::BadEntry {
                        key: format!("<{category}>"),
                        reason: "entry has an empty key".to_string(),
                    });
                }
                if catalog.by_key.contains_key(&key) {
                    return Err(CatalogError::DuplicateKey(key));
                }
                catalog
                    .by_key
                    .insert(key, catalog.entries.len());
                catalog
                    .entries
                    .push(TemplateEntry::new(field, category.clone()));
            }
        }

        if let Some(aliases) = object.get(ALIASES_KEY) {
            let map: HashMap<String, String> = serde_json::from_value(aliases.clone())?;
            let mut pairs: Vec<(String, String)> = map.into_iter().collect();
            pairs.sort();
            for (phrase, key) in pairs {
                let Some(&index) = catalog.by_key.get(&key) else {
                    return Err(CatalogError::DanglingAlias { phrase, key });
                };
                catalog.aliases.push((normalize_for_match(&phrase), index));
            }
        }

        info!(
            entries = catalog.entries.len(),
            aliases = catalog.aliases.len(),
            "template catalog loaded"
        );

        Ok(catalog)
    }

    pub fn entries(&self) -> &[TemplateEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&TemplateEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    /// Alias phrases with their target entries, in phrase order.
    pub fn aliases(&self) -> impl Iterator<Item = (&str, &TemplateEntry)> {
        self.aliases
            .iter()
            .map(|(phrase, i)| (phrase.as_str(), &self.entries[*i]))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Category names, deduplicated, in load order.
    pub fn categories(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for entry in &self.entries {
            if !out.contains(&entry.category.as_str()) {
                out.push(&entry.category);
            }
        }
        out
    }

    /// Structural validation for the `catalog check` surface: reports
    /// anomalies without refusing to load.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for entry in &self.entries {
            let key = &entry.field.key;
            if entry.field.title.trim().is_empty() {
                issues.push(format!("{key}: empty title"));
            }
            if let Some(options) = entry.field.control.options() {
                if options.is_empty() {
                    issues.push(format!("{key}: option control with no options"));
                }
                for option in options {
                    if option.value.is_empty() {
                        issues.push(format!("{key}: option {:?} has an empty value", option.name));
                    }
                }
            }
            if matches!(entry.field.control, crate::models::field::Control::Signature)
                && key != "signature"
            {
                issues.push(format!("{key}: signature entry must use the key \"signature\""));
            }
        }

        issues
    }
}
