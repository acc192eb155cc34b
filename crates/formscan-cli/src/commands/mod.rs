//! CLI subcommands.

pub mod batch;
pub mod catalog;
pub mod config;
pub mod process;

use std::path::Path;
use std::sync::Arc;

use formscan_core::models::config::FormScanConfig;
use formscan_core::{FormParser, TemplateCatalog};

/// Load configuration from an explicit path, falling back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FormScanConfig> {
    match config_path {
        Some(path) => Ok(FormScanConfig::from_file(Path::new(path))?),
        None => Ok(FormScanConfig::default()),
    }
}

/// Load the template catalog: an explicit path, or the embedded default.
pub fn load_catalog(catalog_path: Option<&Path>) -> anyhow::Result<Arc<TemplateCatalog>> {
    let catalog = match catalog_path {
        Some(path) => TemplateCatalog::from_file(path)?,
        None => TemplateCatalog::embedded()?,
    };
    Ok(Arc::new(catalog))
}

/// Build a parser for the given config and catalog path.
pub fn build_parser(
    config_path: Option<&str>,
    catalog_path: Option<&Path>,
) -> anyhow::Result<FormParser> {
    let config = load_config(config_path)?;
    let catalog = load_catalog(catalog_path)?;
    Ok(FormParser::new(catalog).with_config(config))
}
