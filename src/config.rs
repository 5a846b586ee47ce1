//! Configuration structures for training
//!
//! A training run is described by a small JSON document. Every field is
//! optional; missing fields take the defaults used to train the shipped letter
//! models.

use crate::error::{OcrError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk encoding of a saved model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// One scalar per line after the `CNN_MODEL_V1` tag
    #[default]
    Text,
    /// Little-endian `f32` values after the `CNNBIN01` tag
    Binary,
}

/// Configuration for a training run.
///
/// # Example
///
/// ```json
/// {
///   "learning_rate": 0.0005,
///   "epochs": 30,
///   "samples_per_letter": 1000,
///   "seed": 42,
///   "progress_every": 200,
///   "model_path": "model.txt",
///   "model_format": "text"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// SGD step size
    pub learning_rate: f32,

    /// Number of passes over the corpus
    pub epochs: usize,

    /// Numbered samples expected in each letter folder (`A_000.pbm` ..)
    pub samples_per_letter: usize,

    /// Seed for weight initialization and shuffling
    pub seed: u64,

    /// Log progress after this many processed samples
    pub progress_every: usize,

    /// Where the trained model is written
    pub model_path: PathBuf,

    pub model_format: ModelFormat,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.0005,
            epochs: 30,
            samples_per_letter: 1000,
            seed: 42,
            progress_every: 200,
            model_path: PathBuf::from("model.txt"),
            model_format: ModelFormat::Text,
        }
    }
}

impl TrainingConfig {
    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(OcrError::Config(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.epochs == 0 {
            return Err(OcrError::Config("epochs must be at least 1".into()));
        }
        if self.samples_per_letter == 0 {
            return Err(OcrError::Config(
                "samples_per_letter must be at least 1".into(),
            ));
        }
        if self.progress_every == 0 {
            return Err(OcrError::Config("progress_every must be at least 1".into()));
        }
        Ok(())
    }
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `TrainingConfig` and
/// validates it.
///
/// # Examples
///
/// ```no_run
/// use letter_cnn::config::load_config;
///
/// let cfg = load_config("config/train.json").unwrap();
/// assert!(cfg.learning_rate > 0.0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| OcrError::io(path, e))?;
    let config: TrainingConfig = serde_json::from_str(&contents)
        .map_err(|e| OcrError::Config(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}
