//! Configuration loading and management.
//!
//! This module provides utilities for loading service configuration from various
//! sources (TOML, YAML, JSON) and discovering configuration files in the project hierarchy.

use crate::types::CompressionLevel;
use crate::{PdfToolsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the file searched for by [`ServiceConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "pdftools.toml";

/// Main service configuration.
///
/// # Example
///
/// ```rust
/// use pdftools::core::config::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert_eq!(config.merge.max_files, 10);
///
/// // Load from TOML file
/// // let config = ServiceConfig::from_toml_file("pdftools.toml")?;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Compression endpoint settings
    #[serde(default)]
    pub compression: CompressionConfig,

    /// Merge endpoint settings
    #[serde(default)]
    pub merge: MergeConfig,

    /// External Ghostscript settings
    #[serde(default)]
    pub ghostscript: GhostscriptConfig,

    /// Root for per-request temp directories (None = OS temp dir)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

/// Compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    /// Largest accepted upload, in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Level used when the request does not name one
    #[serde(default)]
    pub default_level: CompressionLevel,
}

/// Merge settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Largest accepted file, in megabytes (per file)
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Most files accepted in one merge
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Fewest files accepted in one merge
    #[serde(default = "default_min_files")]
    pub min_files: usize,
}

/// Ghostscript settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostscriptConfig {
    /// Try Ghostscript before the in-process fallback
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Explicit executable (None = search PATH and well-known locations)
    #[serde(default)]
    pub binary: Option<PathBuf>,

    /// Kill Ghostscript after this many seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_max_file_size_mb() -> u64 {
    50
}
fn default_max_files() -> usize {
    10
}
fn default_min_files() -> usize {
    2
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            default_level: CompressionLevel::default(),
        }
    }
}

impl CompressionConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_files: default_max_files(),
            min_files: default_min_files(),
        }
    }
}

impl MergeConfig {
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

impl Default for GhostscriptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            binary: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GhostscriptConfig {
    /// Configuration that never spawns Ghostscript.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `PdfToolsError::Validation` if file doesn't exist or is invalid TOML.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PdfToolsError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        toml::from_str(&content)
            .map_err(|e| PdfToolsError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PdfToolsError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_yaml_ng::from_str(&content)
            .map_err(|e| PdfToolsError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            PdfToolsError::validation(format!("Failed to read config file {}: {}", path.as_ref().display(), e))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| PdfToolsError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))
    }

    /// Load a config file, choosing the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
            Some(ext) if ext == "yaml" || ext == "yml" => Self::from_yaml_file(path),
            Some(ext) if ext == "json" => Self::from_json_file(path),
            _ => Self::from_toml_file(path),
        }
    }

    /// Discover configuration file in parent directories.
    ///
    /// Searches for `pdftools.toml` in current directory and parent directories.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let mut current = std::env::current_dir().map_err(PdfToolsError::Io)?;

        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Ok(Some(Self::from_toml_file(candidate)?));
            }

            if let Some(parent) = current.parent() {
                current = parent.to_path_buf();
            } else {
                break;
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ServiceConfig::default();
        assert_eq!(config.compression.max_file_size_mb, 50);
        assert_eq!(config.compression.default_level, CompressionLevel::Optimized);
        assert_eq!(config.merge.max_files, 10);
        assert_eq!(config.merge.min_files, 2);
        assert!(config.ghostscript.enabled);
        assert_eq!(config.ghostscript.timeout_secs, 120);
        assert!(config.temp_dir.is_none());
    }

    #[test]
    fn test_max_file_size_bytes() {
        let config = ServiceConfig::default();
        assert_eq!(config.compression.max_file_size_bytes(), 50 * 1024 * 1024);
        assert_eq!(config.merge.max_file_size_bytes(), 50 * 1024 * 1024);
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pdftools.toml");

        fs::write(
            &config_path,
            r#"
temp_dir = "/var/tmp/pdftools"

[compression]
max_file_size_mb = 20
default_level = "maximum"

[merge]
max_files = 4

[ghostscript]
enabled = false
timeout_secs = 30
        "#,
        )
        .unwrap();

        let config = ServiceConfig::from_toml_file(&config_path).unwrap();
        assert_eq!(config.compression.max_file_size_mb, 20);
        assert_eq!(config.compression.default_level, CompressionLevel::Maximum);
        assert_eq!(config.merge.max_files, 4);
        assert_eq!(config.merge.min_files, 2);
        assert!(!config.ghostscript.enabled);
        assert_eq!(config.ghostscript.timeout_secs, 30);
        assert_eq!(config.temp_dir, Some(PathBuf::from("/var/tmp/pdftools")));
    }

    #[test]
    fn test_from_toml_file_invalid() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pdftools.toml");
        fs::write(&config_path, "[merge\nmax_files = ").unwrap();

        let err = ServiceConfig::from_toml_file(&config_path).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = ServiceConfig::from_toml_file("/no/such/pdftools.toml").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_from_yaml_and_json_files() {
        let dir = tempdir().unwrap();

        let yaml_path = dir.path().join("pdftools.yaml");
        fs::write(&yaml_path, "merge:\n  max_files: 6\n").unwrap();
        let yaml = ServiceConfig::from_file(&yaml_path).unwrap();
        assert_eq!(yaml.merge.max_files, 6);

        let json_path = dir.path().join("pdftools.json");
        fs::write(&json_path, r#"{"ghostscript": {"binary": "/opt/gs/bin/gs"}}"#).unwrap();
        let json = ServiceConfig::from_file(&json_path).unwrap();
        assert_eq!(json.ghostscript.binary, Some(PathBuf::from("/opt/gs/bin/gs")));
        assert!(json.ghostscript.enabled);
    }

    #[test]
    #[serial_test::serial]
    fn test_discover_pdftools_toml() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "[merge]\nmax_files = 3\n").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&nested).unwrap();

        let result = std::panic::catch_unwind(|| {
            let config = ServiceConfig::discover().unwrap();
            assert!(config.is_some());
            assert_eq!(config.unwrap().merge.max_files, 3);
        });

        std::env::set_current_dir(&original_dir).unwrap();

        if let Err(e) = result {
            std::panic::resume_unwind(e);
        }
    }
}
