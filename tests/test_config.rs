//! Tests for run configuration parsing
//!
//! This file tests the config module including:
//! - Loading the shipped config file
//! - Defaults for missing optional fields
//! - Rejecting invalid values, unknown fields and malformed JSON
//! - Handling missing files

use cnn_inference::config::{load_config, InferenceConfig};
use cnn_inference::CnnError;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn write_temp_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp config");
    file
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_shipped_config() {
        let config = load_config("config/inference.json").expect("Failed to load inference config");

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.init_std, Some(0.1));
        assert_eq!(
            config.architecture,
            Some(PathBuf::from("config/architectures/reference_cnn.json"))
        );
        assert_eq!(config.log_format.as_deref(), Some("compact"));
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let temp_file = write_temp_config("{}");
        let config = load_config(temp_file.path()).unwrap();

        assert_eq!(config.seed, None);
        assert_eq!(config.image_path_or_default(), PathBuf::from("android_Ninja.png"));
        assert_eq!(config.log_filter_or_default(), "cnn_inference=info");
    }

    #[test]
    fn test_default_struct() {
        let config = InferenceConfig::default();
        assert!(config.image_path.is_none());
        assert!(config.architecture.is_none());
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("config/nonexistent.json"),
            Err(CnnError::Io(_))
        ));
    }

    #[test]
    fn test_negative_init_std() {
        let temp_file = write_temp_config(r#"{ "init_std": -0.5 }"#);
        let err = load_config(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("init_std"));
    }

    #[test]
    fn test_unknown_log_format() {
        let temp_file = write_temp_config(r#"{ "log_format": "json" }"#);
        assert!(matches!(
            load_config(temp_file.path()),
            Err(CnnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_blank_log_filter() {
        let temp_file = write_temp_config(r#"{ "log_filter": "  " }"#);
        assert!(load_config(temp_file.path()).is_err());
    }

    #[test]
    fn test_unknown_field() {
        let temp_file = write_temp_config(r#"{ "learning_rate": 0.01 }"#);
        assert!(matches!(
            load_config(temp_file.path()),
            Err(CnnError::Json(_))
        ));
    }

    #[test]
    fn test_negative_seed() {
        let temp_file = write_temp_config(r#"{ "seed": -1 }"#);
        assert!(matches!(
            load_config(temp_file.path()),
            Err(CnnError::Json(_))
        ));
    }
}
