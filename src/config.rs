use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::parsing::confidence::thresholds;

/// Application-level constants
pub const APP_NAME: &str = "labcanon";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding a `tracing` filter directive.
pub const LOG_ENV_VAR: &str = "LABCANON_LOG";

const CONFIG_FILE: &str = "config.json";

/// Filter used when `LABCANON_LOG` is unset or invalid.
pub fn default_log_filter() -> &'static str {
    "labcanon=info"
}

/// Per-user configuration directory, `None` on platforms without one.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Default location of the engine configuration file.
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config JSON parsing failed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables of the ingestion engine. Every field has a default, so a
/// config file only lists what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum alias-lookup confidence for a token span to count as a name.
    pub name_match_threshold: f32,
    /// Measurements below this confidence go to review.
    pub review_threshold: f32,
    pub extraction_timeout_secs: u64,
    /// Tokens taken from following lines when a name's line has no value.
    pub follow_tokens: usize,
    /// Longest biomarker name, in tokens.
    pub max_name_tokens: usize,
    /// Lines scanned for a lab header signature.
    pub header_lines: usize,
    /// Catalog JSON replacing the built-in one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name_match_threshold: 0.75,
            review_threshold: thresholds::MODERATE,
            extraction_timeout_secs: 30,
            follow_tokens: 2,
            max_name_tokens: 4,
            header_lines: 8,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// A missing default file yields the defaults; a missing explicit file
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_path(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_path(&path)?,
                _ => {
                    tracing::debug!("No config file, using defaults");
                    Self::default()
                }
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        tracing::info!(path = %path.display(), "Loaded engine config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_interval = |field: &'static str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} is outside [0, 1]"),
                })
            }
        };
        unit_interval("name_match_threshold", self.name_match_threshold)?;
        unit_interval("review_threshold", self.review_threshold)?;

        if self.extraction_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "extraction_timeout_secs",
                reason: "must be positive".into(),
            });
        }
        if self.max_name_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "max_name_tokens",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn extraction_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.extraction_timeout_secs)
    }
}
