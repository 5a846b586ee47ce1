//! Training corpus layout.
//!
//! The letter corpus keeps one folder per class, each holding numbered samples:
//!
//! ```text
//! root/A/A_000.pbm
//! root/A/A_001.pbm
//! ...
//! root/Z/Z_999.pbm
//! ```
//!
//! Paths are generated up front; whether a file actually exists is only found
//! out when the training loop reads it.

use crate::recognition::{class_to_letter, NUM_LETTERS};
use std::path::{Path, PathBuf};

/// One labelled training image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub path: PathBuf,
    pub label: usize,
}

/// An ordered list of samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    samples: Vec<Sample>,
}

/// Path of sample `index` of `letter` under `root`.
pub fn sample_path(root: &Path, letter: char, index: usize) -> PathBuf {
    root.join(letter.to_string())
        .join(format!("{}_{:03}.pbm", letter, index))
}

impl Corpus {
    /// `samples_per_letter` samples for each of `A`..`Z`, grouped by letter.
    pub fn letters(root: impl AsRef<Path>, samples_per_letter: usize) -> Self {
        let root = root.as_ref();
        let samples = (0..NUM_LETTERS)
            .flat_map(|label| {
                let letter = class_to_letter(label);
                (0..samples_per_letter).map(move |index| Sample {
                    path: sample_path(root, letter, index),
                    label,
                })
            })
            .collect();
        Self { samples }
    }

    pub fn from_samples(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
