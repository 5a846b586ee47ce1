//! Letter CNN Library
//!
//! A hand-written convolutional network that classifies 50×50 binary letter images
//! into the 26 classes `A`..`Z`, together with its training loop and model files.
//!
//! # Modules
//!
//! - `tensor`: 3-D tensors with bounds-checked accessors
//! - `layers`: Layer trait and implementations (Conv2D, MaxPool, Dense)
//! - `network`: the fixed letter architecture, forward cache and gradients
//! - `optimizers`: Optimizer trait and SGD
//! - `utils`: Shared utilities (RNG, activation functions)
//! - `architecture`: Architecture configuration and shape validation
//! - `config`: Training configuration structures
//! - `image`: Netpbm (PBM/PGM) loading
//! - `dataset`: Training corpus layout
//! - `train`: Training step and epoch loop
//! - `model_io`: Text and binary model files
//! - `classifier`: High-level train / predict / save / load facade
//! - `recognition`: Letter decoding and grid/word recognition
//! - `error`: Error types

pub mod architecture;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod error;
pub mod image;
pub mod layers;
pub mod model_io;
pub mod network;
pub mod optimizers;
pub mod recognition;
pub mod tensor;
pub mod train;
pub mod utils;

pub use classifier::LetterClassifier;
pub use error::{ImageFormatError, ModelFileError, OcrError, Result};
pub use network::{ForwardCache, Gradients, Network};
pub use tensor::{Shape, Tensor};
