//! Layer abstractions for the letter network
//!
//! This module provides the Layer trait for parameterized layers plus the
//! convolution, max pooling and dense implementations.

mod r#trait;
pub mod conv2d;
pub mod dense;
pub mod pooling;

// Re-export the Layer trait for convenience
pub use r#trait::Layer;
pub use conv2d::{conv_output_size, Conv2DLayer, ConvGradients};
pub use dense::{DenseGradients, DenseLayer};
pub use pooling::{pool_output_size, MaxPoolLayer, PoolArgmax};
