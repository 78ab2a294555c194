//! HintGuard Configuration Module
//!
//! Config is stored in `~/.config/hintguard/config.toml` or passed with
//! `--config`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command line flags (`--format`)
//! 2. Environment variables (`HINTGUARD_FORMAT`, `RUST_LOG`)
//! 3. Config file
//! 4. Defaults
//!
//! ```toml
//! [namespace]
//! prefix = "eoap"
//! uri = "https://eoap.ogc.org/"
//!
//! [output]
//! format = "json"
//!
//! [log]
//! filter = "hintguard=debug"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HintGuardError, Result};
use crate::hint::Namespace;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HintGuardConfig {
    #[serde(default)]
    pub namespace: NamespaceConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Namespace assertion hints are looked up in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamespaceConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Expanded namespace IRI, for documents using full class IRIs
    #[serde(default)]
    pub uri: Option<String>,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            uri: None,
        }
    }
}

fn default_prefix() -> String {
    "eoap".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

/// Report rendering
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl HintGuardConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/hintguard/` on Unix, `%APPDATA%/hintguard/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hintguard")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load the user configuration
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load an explicit config file; it must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| HintGuardError::ConfigError {
            reason: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| HintGuardError::ConfigError {
            reason: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Write a default config to `path`
    ///
    /// An existing file is only replaced with `force`.
    pub fn init(path: &Path, force: bool) -> Result<Self> {
        if path.exists() && !force {
            return Err(HintGuardError::ConfigError {
                reason: format!(
                    "Config file {} already exists (use --force to overwrite)",
                    path.display()
                ),
            });
        }
        let config = Self::default();
        config.save_to(path)?;
        tracing::info!(path = %path.display(), "Wrote default config");
        Ok(config)
    }

    /// Save to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| HintGuardError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        fs::write(path, self.to_toml()?).map_err(|e| HintGuardError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })
    }

    /// Serialize as the TOML a config file would hold
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| HintGuardError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    pub fn with_env(self) -> Self {
        self.with_format_override(std::env::var("HINTGUARD_FORMAT").ok())
    }

    /// Apply a format override; unknown values are ignored with a warning
    pub fn with_format_override(mut self, value: Option<String>) -> Self {
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return self;
        };
        match OutputFormat::parse(&value) {
            Some(format) => self.output.format = format,
            None => tracing::warn!(value = %value, "Ignoring unknown HINTGUARD_FORMAT"),
        }
        self
    }

    /// Namespace for the hint registry
    pub fn namespace(&self) -> Namespace {
        let namespace = Namespace::new(self.namespace.prefix.clone());
        match &self.namespace.uri {
            Some(uri) if !uri.is_empty() => namespace.with_uri(uri.clone()),
            _ => namespace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path_contains_hintguard() {
        let path = HintGuardConfig::config_path();
        assert!(path.to_string_lossy().contains("hintguard"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = HintGuardConfig::default();
        assert_eq!(config.namespace.prefix, "eoap");
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.log.filter, "info");
        assert_eq!(config.namespace(), Namespace::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: HintGuardConfig = toml::from_str(
            r#"
[namespace]
uri = "https://eoap.ogc.org/"

[output]
format = "json"
"#,
        )
        .unwrap();
        assert_eq!(config.namespace.prefix, "eoap");
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(
            config.namespace().uri.as_deref(),
            Some("https://eoap.ogc.org/")
        );
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = HintGuardConfig::default();
        config.namespace.prefix = "assert".to_string();
        config.log.filter = "hintguard=debug".to_string();
        config.save_to(&path).unwrap();

        let loaded = HintGuardConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hintguard").join("config.toml");

        let written = HintGuardConfig::init(&path, false).unwrap();
        assert_eq!(written, HintGuardConfig::default());
        assert_eq!(HintGuardConfig::load_from(&path).unwrap(), written);
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[namespace]\nprefix = \"assert\"\n").unwrap();

        let err = HintGuardConfig::init(&path, false).unwrap_err();
        assert_eq!(err.code(), "HG-030");
        assert!(err.to_string().contains("--force"));
        assert_eq!(
            HintGuardConfig::load_from(&path).unwrap().namespace.prefix,
            "assert"
        );

        HintGuardConfig::init(&path, true).unwrap();
        assert_eq!(
            HintGuardConfig::load_from(&path).unwrap(),
            HintGuardConfig::default()
        );
    }

    #[test]
    fn test_to_toml_shows_effective_values() {
        let config = HintGuardConfig::default().with_format_override(Some("json".to_string()));
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("format = \"json\""));
        assert!(rendered.contains("prefix = \"eoap\""));
        assert_eq!(toml::from_str::<HintGuardConfig>(&rendered).unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[output\nformat = ").unwrap();
        let err = HintGuardConfig::load_from(&path).unwrap_err();
        assert_eq!(err.code(), "HG-030");
    }

    #[test]
    fn test_missing_explicit_file_is_config_error() {
        let err = HintGuardConfig::load_from(Path::new("/nope/config.toml")).unwrap_err();
        assert_eq!(err.code(), "HG-030");
    }

    #[test]
    fn test_format_override() {
        let config = HintGuardConfig::default().with_format_override(Some("JSON".to_string()));
        assert_eq!(config.output.format, OutputFormat::Json);

        let config = config.with_format_override(Some("yaml".to_string()));
        assert_eq!(config.output.format, OutputFormat::Json);

        let config = config.with_format_override(None);
        assert_eq!(config.output.format, OutputFormat::Json);
    }
}
