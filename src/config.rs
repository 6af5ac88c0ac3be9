//! Run configuration
//!
//! Settings for a single inference run: which image to classify, how the
//! weights are drawn and which architecture file to build. Every field is
//! optional; command-line flags override whatever the file provides.

use crate::error::{CnnError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Image classified when neither the command line nor the config names one.
pub const DEFAULT_IMAGE: &str = "android_Ninja.png";

/// Log filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "cnn_inference=info";

/// Accepted values for `log_format`.
pub const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "full"];

/// Configuration for one inference run.
///
/// # Example
///
/// ```json
/// {
///   "image_path": "android_Ninja.png",
///   "seed": 42,
///   "init_std": 0.1,
///   "architecture": "config/architectures/reference_cnn.json",
///   "log_filter": "cnn_inference=debug",
///   "log_format": "compact"
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InferenceConfig {
    /// PNG to classify
    pub image_path: Option<PathBuf>,

    /// Seed for the weight generator (random when absent)
    pub seed: Option<u64>,

    /// Standard deviation of the Gaussian weight initializer (default 0.1)
    pub init_std: Option<f32>,

    /// Architecture JSON file (the reference topology when absent)
    pub architecture: Option<PathBuf>,

    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: Option<String>,

    /// Log line format: "pretty", "compact" or "full"
    pub log_format: Option<String>,
}

impl InferenceConfig {
    pub fn image_path_or_default(&self) -> PathBuf {
        self.image_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE))
    }

    pub fn log_filter_or_default(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

/// Loads a run configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it and validates every value.
///
/// # Examples
///
/// ```no_run
/// use cnn_inference::config::load_config;
///
/// let cfg = load_config("config/inference.json").unwrap();
/// assert_eq!(cfg.seed, Some(42));
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<InferenceConfig> {
    let contents = fs::read_to_string(path)?;
    let config: InferenceConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &InferenceConfig) -> Result<()> {
    if let Some(std) = config.init_std {
        validate_init_std(std)?;
    }

    if let Some(ref format) = config.log_format {
        validate_log_format(format)?;
    }

    if let Some(ref filter) = config.log_filter {
        if filter.trim().is_empty() {
            return Err(CnnError::invalid_config("log_filter must not be empty"));
        }
    }

    Ok(())
}

pub fn validate_init_std(std: f32) -> Result<()> {
    if !std.is_finite() || std <= 0.0 {
        return Err(CnnError::invalid_config(format!(
            "init_std must be a positive finite number, got {}",
            std
        )));
    }
    Ok(())
}

pub fn validate_log_format(format: &str) -> Result<()> {
    if !LOG_FORMATS.contains(&format) {
        return Err(CnnError::invalid_config(format!(
            "Invalid log_format '{}'. Must be one of: {}",
            format,
            LOG_FORMATS.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = InferenceConfig::default();
        assert_eq!(cfg.image_path_or_default(), PathBuf::from("android_Ninja.png"));
        assert_eq!(cfg.log_filter_or_default(), "cnn_inference=info");
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_std() {
        let cfg = InferenceConfig {
            init_std: Some(0.0),
            ..InferenceConfig::default()
        };
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_format() {
        let err = validate_log_format("json").unwrap_err();
        assert!(err.to_string().contains("pretty, compact, full"));
    }
}
