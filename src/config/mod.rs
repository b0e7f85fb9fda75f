//! Configuration management for unit-loader
//!
//! Handles configuration loading and validation for loader construction.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Separator-delimited archive list, in search order
    #[serde(default)]
    pub archive_path: String,

    /// Archive list separator
    #[serde(default = "default_path_separator")]
    pub path_separator: char,

    /// Extensions (without dot) of directly loadable archives; anything else
    /// is treated as a container
    #[serde(default = "default_direct_extensions")]
    pub direct_extensions: Vec<String>,

    /// Extension (without dot) of unit entries inside archives
    #[serde(default = "default_unit_extension")]
    pub unit_extension: String,

    /// Unit name prefixes always resolved through the parent first
    #[serde(default)]
    pub parent_first: Vec<String>,

    /// Directory receiving archives extracted from containers
    #[serde(default = "default_extraction_dir")]
    pub extraction_dir: String,

    /// Exact container entry to extract (default: first loadable archive entry)
    #[serde(default)]
    pub embedded_entry: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g. "info", "unit_loader::loader=debug"); RUST_LOG wins
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON logs (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

fn default_path_separator() -> char {
    if cfg!(windows) {
        ';'
    } else {
        ':'
    }
}

fn default_direct_extensions() -> Vec<String> {
    vec!["tar".to_string()]
}

fn default_unit_extension() -> String {
    "class".to_string()
}

fn default_extraction_dir() -> String {
    "data/extracted".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            archive_path: String::new(),
            path_separator: default_path_separator(),
            direct_extensions: default_direct_extensions(),
            unit_extension: default_unit_extension(),
            parent_first: Vec::new(),
            extraction_dir: default_extraction_dir(),
            embedded_entry: None,
            logging: None,
        }
    }
}

impl LoaderConfig {
    /// Configuration for an archive list with all other settings defaulted
    pub fn for_archives(archive_path: impl Into<String>) -> Self {
        Self {
            archive_path: archive_path.into(),
            ..Self::default()
        }
    }

    /// Load configuration from TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LoaderConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LoaderConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML or JSON depending on the file extension
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Save configuration to JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if matches!(self.path_separator, '/' | '.' | '\\') {
            return Err(anyhow::anyhow!(
                "path_separator {:?} would split archive paths apart",
                self.path_separator
            ));
        }

        if self.direct_extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "direct_extensions must name at least one archive extension"
            ));
        }
        for ext in &self.direct_extensions {
            if ext.is_empty() || ext.starts_with('.') {
                return Err(anyhow::anyhow!(
                    "direct_extensions entries must be non-empty and written without a dot, got {:?}",
                    ext
                ));
            }
        }

        if self.unit_extension.is_empty() || self.unit_extension.starts_with('.') {
            return Err(anyhow::anyhow!(
                "unit_extension must be non-empty and written without a dot"
            ));
        }

        if self.parent_first.iter().any(|p| p.is_empty()) {
            return Err(anyhow::anyhow!(
                "parent_first prefixes cannot be empty (an empty prefix matches every unit)"
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let config = LoaderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.unit_extension, "class");
        assert_eq!(config.direct_extensions, vec!["tar".to_string()]);
    }

    #[test]
    fn test_toml_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        std::fs::write(
            &path,
            r#"
archive_path = "libs/a.tar:apps/app.pkg"
parent_first = ["core.", "platform."]

[logging]
filter = "debug"
"#,
        )
        .unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.archive_path, "libs/a.tar:apps/app.pkg");
        assert_eq!(config.parent_first, vec!["core.", "platform."]);
        assert_eq!(config.extraction_dir, "data/extracted");
        assert_eq!(config.logging.unwrap().filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("loader.json");
        let mut config = LoaderConfig::for_archives("a.tar");
        config.parent_first = vec!["core.".to_string()];
        config.to_json_file(&path).unwrap();

        let loaded = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(loaded.archive_path, "a.tar");
        assert_eq!(loaded.parent_first, vec!["core."]);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = LoaderConfig::default();
        config.parent_first = vec![String::new()];
        assert!(config.validate().is_err());

        let mut config = LoaderConfig::default();
        config.direct_extensions = vec![".tar".to_string()];
        assert!(config.validate().is_err());

        let mut config = LoaderConfig::default();
        config.path_separator = '/';
        assert!(config.validate().is_err());

        let mut config = LoaderConfig::default();
        config.unit_extension = String::new();
        assert!(config.validate().is_err());
    }
}
