//! Error types for the letter classifier.
//!
//! Image and model-file problems are data errors and are returned as values.
//! Shape mismatches between consecutive layers are configuration bugs and panic
//! instead (see `tensor` and `layers`).

use std::io;
use std::path::PathBuf;

/// Problems found while decoding a PBM/PGM image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageFormatError {
    #[error("unsupported magic number {0:?} (expected P1, P2, P4 or P5)")]
    UnsupportedMagic(String),

    #[error("malformed header: {0}")]
    BadHeader(&'static str),

    #[error("image must be {expected_width}x{expected_height}, got {width}x{height}")]
    Dimensions {
        expected_width: usize,
        expected_height: usize,
        width: usize,
        height: usize,
    },

    #[error("pixel data truncated: expected {expected} samples, read {found}")]
    Truncated { expected: usize, found: usize },

    #[error("invalid pixel value {value:?} at sample {index}")]
    InvalidPixel { index: usize, value: String },
}

/// Problems found while reading a persisted model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelFileError {
    #[error("model file is empty (missing format tag)")]
    MissingTag,

    #[error("unknown model format tag {0:?}")]
    WrongTag(String),

    #[error("model data truncated: expected {expected} parameters, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("non-numeric parameter {token:?} at position {index}")]
    InvalidToken { index: usize, token: String },

    #[error("model declares {found} parameters but the network has {expected}")]
    CountMismatch { expected: usize, found: usize },

    #[error("unexpected data after the last of {expected} parameters")]
    TrailingData { expected: usize },
}

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image format error: {0}")]
    ImageFormat(#[from] ImageFormatError),

    #[error("model file error: {0}")]
    ModelFile(#[from] ModelFileError),

    #[error("training sample missing: {}", path.display())]
    SampleMissing { path: PathBuf },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl OcrError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        OcrError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, OcrError>;
