//! Configuration for the import pipeline.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with GRIDWIRE_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Complete pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Auto-layout settings
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Dependency resolution settings
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Registration settings
    #[serde(default)]
    pub registrar: RegistrarConfig,
}

/// Auto-layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Horizontal distance between layer columns
    #[serde(default = "default_column_width")]
    pub column_width: u32,

    /// Vertical gap between unrelated sub-graphs
    #[serde(default = "default_component_spacing")]
    pub component_spacing: u32,

    /// Column of layer 0
    #[serde(default)]
    pub origin_x: i32,

    /// Top row of the first band
    #[serde(default)]
    pub origin_y: i32,
}

/// Dependency resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Longest accepted chain of nested dependencies
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Stop at the first failed dependency instead of collecting all
    #[serde(default)]
    pub fail_fast: bool,
}

/// Registration settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrarConfig {
    /// Catalog path for newly registered composite types
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

// Default value functions
fn default_column_width() -> u32 {
    2
}

fn default_component_spacing() -> u32 {
    5
}

fn default_max_depth() -> usize {
    64
}

fn default_catalog_path() -> String {
    "Custom".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            column_width: default_column_width(),
            component_spacing: default_component_spacing(),
            origin_x: 0,
            origin_y: 0,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            max_depth: default_max_depth(),
            fail_fast: false,
        }
    }
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        RegistrarConfig {
            catalog_path: default_catalog_path(),
        }
    }
}

impl ImportConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = config_file {
            Self::from_file(path)?
        } else {
            ImportConfig::default()
        };

        let config = config.merge_env();
        config.validate()?;
        Ok(config)
    }

    /// Merge environment variables into this configuration.
    #[must_use]
    pub fn merge_env(self) -> Self {
        self.merge_env_from(|key| std::env::var(key).ok())
    }

    /// Merge overrides from `lookup` into this configuration.
    ///
    /// Only keys that `lookup` returns override the current values; values
    /// that fail to parse are ignored.
    #[must_use]
    pub fn merge_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Layout
        if let Some(v) = lookup("GRIDWIRE_COLUMN_WIDTH") {
            if let Ok(val) = v.parse() {
                self.layout.column_width = val;
            }
        }
        if let Some(v) = lookup("GRIDWIRE_COMPONENT_SPACING") {
            if let Ok(val) = v.parse() {
                self.layout.component_spacing = val;
            }
        }
        if let Some(v) = lookup("GRIDWIRE_ORIGIN_X") {
            if let Ok(val) = v.parse() {
                self.layout.origin_x = val;
            }
        }
        if let Some(v) = lookup("GRIDWIRE_ORIGIN_Y") {
            if let Ok(val) = v.parse() {
                self.layout.origin_y = val;
            }
        }

        // Resolver
        if let Some(v) = lookup("GRIDWIRE_MAX_DEPENDENCY_DEPTH") {
            if let Ok(val) = v.parse() {
                self.resolver.max_depth = val;
            }
        }
        if let Some(v) = lookup("GRIDWIRE_FAIL_FAST") {
            if let Ok(val) = v.parse() {
                self.resolver.fail_fast = val;
            }
        }

        // Registrar
        if let Some(v) = lookup("GRIDWIRE_CATALOG_PATH") {
            self.registrar.catalog_path = v;
        }

        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.layout.column_width == 0 {
            return Err(ConfigError::ValidationError(
                "layout.column_width must be greater than 0".to_string(),
            ));
        }

        if self.resolver.max_depth == 0 {
            return Err(ConfigError::ValidationError(
                "resolver.max_depth must be greater than 0".to_string(),
            ));
        }

        if self.registrar.catalog_path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "registrar.catalog_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
