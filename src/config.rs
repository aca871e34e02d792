use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::avl::Tolerance;
use crate::filter::DEFAULT_FIRST_YEAR;
use crate::loader::LoadOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid tolerance {0}: must be finite and non-negative")]
    InvalidTolerance(f64),

    #[error("Invalid delimiter {0:?}: must be a single ASCII character")]
    InvalidDelimiter(char),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings of an interactive session
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```json
/// { "tolerance": 0.001, "delimiter": ";" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Dataset loaded at startup
    pub data: Option<PathBuf>,

    /// CSV field delimiter
    pub delimiter: char,

    /// Whether the CSV starts with a header row
    pub has_headers: bool,

    /// Distance under which a typed key matches a stored one
    pub tolerance: f64,

    /// Year of the first measurement column
    pub first_year: i32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data: None,
            delimiter: ',',
            has_headers: true,
            tolerance: Tolerance::DEFAULT.value(),
            first_year: DEFAULT_FIRST_YEAR,
        }
    }
}

impl SessionConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        let config: SessionConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.key_tolerance()?;
        self.load_options()?;
        Ok(())
    }

    pub fn key_tolerance(&self) -> ConfigResult<Tolerance> {
        Tolerance::new(self.tolerance).ok_or(ConfigError::InvalidTolerance(self.tolerance))
    }

    pub fn load_options(&self) -> ConfigResult<LoadOptions> {
        let delimiter = u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or(ConfigError::InvalidDelimiter(self.delimiter))?;

        Ok(LoadOptions {
            delimiter,
            has_headers: self.has_headers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.key_tolerance().unwrap(), Tolerance::DEFAULT);
        assert_eq!(config.load_options().unwrap(), LoadOptions::default());
        assert_eq!(config.first_year, 1961);
        assert!(config.data.is_none());
    }

    #[test]
    fn test_partial_json() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "tolerance": 0.01, "delimiter": ";" }"#).unwrap();
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.load_options().unwrap().delimiter, b';');
        assert!(config.has_headers);
    }

    #[test]
    fn test_invalid_values() {
        let config = SessionConfig {
            tolerance: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTolerance(_))
        ));

        let config = SessionConfig {
            delimiter: 'é',
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDelimiter('é'))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("session.json");

        let config = SessionConfig {
            data: Some(PathBuf::from("data/temperatures.csv")),
            first_year: 1970,
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(SessionConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, r#"{ "tolerance": -0.5 }"#).unwrap();

        assert!(matches!(
            SessionConfig::load(&path),
            Err(ConfigError::InvalidTolerance(_))
        ));
        assert!(matches!(
            SessionConfig::load(&temp_dir.path().join("missing.json")),
            Err(ConfigError::IoError(_))
        ));
    }
}
