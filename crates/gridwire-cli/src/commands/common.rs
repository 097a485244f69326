//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use gridwire_import::ImportConfig;
use gridwire_ir::{RecordDocument, SchemaCatalog, StructuralRecord};

/// Load a Structural Record from a JSON file.
pub fn load_record(path: &str, catalog: &SchemaCatalog) -> Result<StructuralRecord> {
    let path_obj = Path::new(path);

    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }

    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;

    let document =
        RecordDocument::from_json(&source).with_context(|| format!("Failed to parse record: {path}"))?;
    let record = document
        .into_record(catalog)
        .with_context(|| format!("Invalid record: {path}"))?;
    debug!(
        "Loaded record '{}' from {}: {} components",
        record.name(),
        path,
        record.num_components()
    );
    Ok(record)
}

/// Load the pipeline configuration: file, then environment overrides.
pub fn load_config(path: Option<&str>) -> Result<ImportConfig> {
    let config = ImportConfig::load(path.map(Path::new)).context("Failed to load configuration")?;
    debug!("Configuration: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = load_record("/nonexistent/record.json", &SchemaCatalog::with_builtins()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_default_config() {
        let config = load_config(None).unwrap();
        assert!(config.layout.column_width > 0);
    }
}
