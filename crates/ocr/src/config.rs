use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::preprocess::{RecipePolicy, LIGHT_MAX_STD, MEDIUM_MAX_STD};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration, read from a TOML file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectoConfig {
    pub preprocess: PreprocessConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Standard deviation below which the light recipe is used.
    pub light_max_std: f64,
    /// Inclusive upper bound of the medium recipe.
    pub medium_max_std: f64,
    /// Force the heavy recipe on images brighter than this mean. Off when absent.
    pub washed_out_mean: Option<f64>,
    pub deskew: bool,
    /// Longest side kept before filtering; `0` disables downscaling.
    pub max_dimension: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            light_max_std: LIGHT_MAX_STD,
            medium_max_std: MEDIUM_MAX_STD,
            washed_out_mean: None,
            deskew: false,
            max_dimension: 2800,
        }
    }
}

impl PreprocessConfig {
    pub fn policy(&self) -> RecipePolicy {
        RecipePolicy {
            light_max_std: self.light_max_std,
            medium_max_std: self.medium_max_std,
            washed_out_mean: self.washed_out_mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Directory holding `*.traineddata`; the engine default when absent.
    pub tessdata: Option<PathBuf>,
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { tessdata: None, language: "eng".to_string() }
    }
}

impl RectoConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: RectoConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.preprocess;
        if !(p.light_max_std.is_finite() && p.medium_max_std.is_finite()) {
            return Err(ConfigError::Invalid("std thresholds must be finite".into()));
        }
        if p.light_max_std > p.medium_max_std {
            return Err(ConfigError::Invalid(format!(
                "light_max_std ({}) exceeds medium_max_std ({})",
                p.light_max_std, p.medium_max_std
            )));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr.language is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RectoConfig::from_toml("").unwrap();
        assert_eq!(config, RectoConfig::default());
        assert_eq!(config.preprocess.policy(), RecipePolicy::default());
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = RectoConfig::from_toml(
            r#"
            [preprocess]
            washed_out_mean = 200.0
            deskew = true

            [ocr]
            tessdata = "/usr/share/tessdata"
            "#,
        )
        .unwrap();
        assert_eq!(config.preprocess.washed_out_mean, Some(200.0));
        assert!(config.preprocess.deskew);
        assert_eq!(config.preprocess.light_max_std, 30.0);
        assert_eq!(config.preprocess.max_dimension, 2800);
        assert_eq!(config.ocr.tessdata, Some(PathBuf::from("/usr/share/tessdata")));
        assert_eq!(config.ocr.language, "eng");
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = RectoConfig::from_toml("[preprocess]\nlight_max_std = 60.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = RectoConfig::from_toml("[preprocess\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recto.toml");
        std::fs::write(&path, "[preprocess]\nmedium_max_std = 60.0\n").unwrap();
        assert_eq!(RectoConfig::load(&path).unwrap().preprocess.medium_max_std, 60.0);

        let err = RectoConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
