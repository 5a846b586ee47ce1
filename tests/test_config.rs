//! Tests for configuration parsing
//!
//! This file tests the config and architecture modules including:
//! - Loading valid JSON config files
//! - Partial documents falling back to defaults
//! - Handling invalid JSON and out-of-range values
//! - Handling missing files

use letter_cnn::architecture::load_architecture;
use letter_cnn::config::{load_config, ModelFormat, TrainingConfig};
use letter_cnn::OcrError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn write_json(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write config");
    path
}

// ============================================================================
// Valid Config Loading Tests
// ============================================================================

mod valid_config_tests {
    use super::*;

    #[test]
    fn test_load_full_config() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "train.json",
            r#"{
                "learning_rate": 0.01,
                "epochs": 5,
                "samples_per_letter": 20,
                "seed": 7,
                "progress_every": 10,
                "model_path": "out/model.bin",
                "model_format": "binary"
            }"#,
        );

        let config = load_config(&path).expect("Failed to load config");

        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.epochs, 5);
        assert_eq!(config.samples_per_letter, 20);
        assert_eq!(config.seed, 7);
        assert_eq!(config.progress_every, 10);
        assert_eq!(config.model_path, PathBuf::from("out/model.bin"));
        assert_eq!(config.model_format, ModelFormat::Binary);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "epochs": 3 }"#);

        let config = load_config(&path).unwrap();

        assert_eq!(config.epochs, 3);
        assert_eq!(
            config,
            TrainingConfig {
                epochs: 3,
                ..TrainingConfig::default()
            }
        );
    }

    #[test]
    fn test_empty_object_is_default() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", "{}");
        assert_eq!(load_config(&path).unwrap(), TrainingConfig::default());
    }

    #[test]
    fn test_load_architecture_file() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "arch.json",
            r#"{
                "input_height": 12,
                "input_width": 12,
                "conv1": { "filters": 2, "kernel_size": 3 },
                "pool1": { "size": 2, "stride": 2 },
                "conv2": { "filters": 3, "kernel_size": 3, "padding": 1 },
                "pool2": { "size": 5, "stride": 5 },
                "hidden_size": 4,
                "num_classes": 3
            }"#,
        );

        let arch = load_architecture(&path).unwrap();
        let shapes = arch.validate().unwrap();

        // 12 -> conv 10 -> pool 5 -> padded conv 5 -> pool 1
        assert_eq!(shapes.pool2.len(), 3);
        assert_eq!(shapes.flatten, 3);
    }
}

// ============================================================================
// Invalid Config Tests
// ============================================================================

mod invalid_config_tests {
    use super::*;

    #[test]
    fn test_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "epochs": "#);
        assert!(matches!(load_config(&path), Err(OcrError::Config(_))));
    }

    #[test]
    fn test_wrong_field_type() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "epochs": "many" }"#);
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_unknown_model_format() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "model_format": "hdf5" }"#);
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_negative_learning_rate() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "learning_rate": -0.1 }"#);

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("learning_rate"));
    }

    #[test]
    fn test_zero_epochs() {
        let dir = TempDir::new().unwrap();
        let path = write_json(&dir, "train.json", r#"{ "epochs": 0 }"#);
        assert!(matches!(load_config(&path), Err(OcrError::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/path/train.json");
        assert!(matches!(result, Err(OcrError::Io { .. })));
    }

    #[test]
    fn test_architecture_that_does_not_tile() {
        let dir = TempDir::new().unwrap();
        let path = write_json(
            &dir,
            "arch.json",
            r#"{ "conv1": { "filters": 16, "kernel_size": 4, "stride": 3 } }"#,
        );
        assert!(matches!(load_architecture(&path), Err(OcrError::Config(_))));
    }
}
