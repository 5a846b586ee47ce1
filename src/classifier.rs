//! High-level letter classifier.
//!
//! Bundles a [`Network`] with its [`TrainingConfig`] and the RNG that seeded
//! it, and exposes the operations the rest of the OCR pipeline needs: train on
//! a letter corpus, classify an image, and save or load the model.

use crate::config::{ModelFormat, TrainingConfig};
use crate::dataset::Corpus;
use crate::error::{ImageFormatError, OcrError, Result};
use crate::image::Image;
use crate::model_io;
use crate::network::Network;
use crate::recognition::{class_to_letter, top_k, NUM_LETTERS};
use crate::tensor::Tensor;
use crate::train::{self, TrainingReport};
use crate::utils::SimpleRng;
use log::warn;
use std::path::Path;

/// Letter classifier facade.
///
/// # Example
///
/// ```
/// use letter_cnn::config::TrainingConfig;
/// use letter_cnn::image::Image;
/// use letter_cnn::LetterClassifier;
///
/// let classifier = LetterClassifier::new(TrainingConfig::default());
/// let letter = classifier.recognize(&Image::filled(50, 50, 0.0)).unwrap();
/// assert!(letter.is_ascii_uppercase());
/// ```
#[derive(Debug, Clone)]
pub struct LetterClassifier {
    network: Network,
    config: TrainingConfig,
    rng: SimpleRng,
}

impl LetterClassifier {
    /// Fresh letter network seeded from `config.seed`.
    pub fn new(config: TrainingConfig) -> Self {
        let mut rng = SimpleRng::new(config.seed);
        let network = Network::letters(&mut rng);
        Self {
            network,
            config,
            rng,
        }
    }

    /// Wrap an existing network, which must have one output per letter.
    pub fn with_network(network: Network, config: TrainingConfig) -> Result<Self> {
        if network.num_classes() != NUM_LETTERS {
            return Err(OcrError::Config(format!(
                "letter classifier needs {} output classes, network has {}",
                NUM_LETTERS,
                network.num_classes()
            )));
        }
        let rng = SimpleRng::new(config.seed);
        Ok(Self {
            network,
            config,
            rng,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train on the `A`..`Z` folders under `corpus_root`.
    pub fn train(&mut self, corpus_root: impl AsRef<Path>) -> Result<TrainingReport> {
        let corpus = Corpus::letters(corpus_root, self.config.samples_per_letter);
        self.train_corpus(&corpus)
    }

    pub fn train_corpus(&mut self, corpus: &Corpus) -> Result<TrainingReport> {
        train::train(&mut self.network, corpus, &self.config, &mut self.rng)
    }

    fn input(&self, image: &Image) -> Result<Tensor> {
        let shape = self.network.input_shape();
        if image.height() != shape.rows || image.width() != shape.cols {
            return Err(ImageFormatError::Dimensions {
                expected_width: shape.cols,
                expected_height: shape.rows,
                width: image.width(),
                height: image.height(),
            }
            .into());
        }
        Ok(image.to_tensor())
    }

    /// Class index of the most probable letter.
    pub fn predict(&self, image: &Image) -> Result<usize> {
        Ok(self.network.predict(&self.input(image)?))
    }

    pub fn recognize(&self, image: &Image) -> Result<char> {
        Ok(class_to_letter(self.predict(image)?))
    }

    pub fn probabilities(&self, image: &Image) -> Result<Vec<f32>> {
        Ok(self.network.probabilities(&self.input(image)?))
    }

    /// The `k` most probable letters, best first.
    pub fn top_k(&self, image: &Image, k: usize) -> Result<Vec<(char, f32)>> {
        let probabilities = self.probabilities(image)?;
        Ok(top_k(&probabilities, k)
            .into_iter()
            .map(|(class, p)| (class_to_letter(class), p))
            .collect())
    }

    /// Save in the configured format.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        model_io::save(&self.network, path, self.config.model_format)
    }

    /// Load a model, keeping the current network on failure.
    pub fn try_load_model(&mut self, path: impl AsRef<Path>) -> Result<ModelFormat> {
        model_io::load(path, &mut self.network)
    }

    /// Like [`LetterClassifier::try_load_model`], logging the error instead of
    /// returning it.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        match self.try_load_model(path) {
            Ok(_) => true,
            Err(err) => {
                warn!("Could not load model {}: {}", path.display(), err);
                false
            }
        }
    }
}
