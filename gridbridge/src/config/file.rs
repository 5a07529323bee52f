//! Configuration file handling for ~/.gridbridge/config.ini.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::{BridgeConfig, GridConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Parsed contents of a config file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub bridge: BridgeConfig,
    /// Present only when the file has a `[grid]` section.
    pub grid: Option<GridConfig>,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.gridbridge/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Parse configuration from INI text.
    pub fn from_ini_str(content: &str) -> Result<Self, ConfigFileError> {
        let ini = Ini::load_from_str(content).map_err(ini::Error::Parse)?;
        super::parser::parse_ini(&ini)
    }
}

/// Get the path to the config directory (~/.gridbridge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".gridbridge")
}

/// Get the path to the config file (~/.gridbridge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert!(config.grid.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(
            &config_path,
            "[bridge]\nenable_reprojection = false\ndefault_maximum_level = 12\n",
        )
        .unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert!(!config.bridge.enable_reprojection);
        assert_eq!(config.bridge.default_maximum_level, 12);
        assert_eq!(config.bridge.default_tile_size, 256);
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with(".gridbridge/config.ini"));
    }
}
