//! Optimizer abstractions for parameter updates
//!
//! Layers hand their parameter slices and the matching gradient slices to an
//! [`Optimizer`], which decides how to step. The letter network trains with
//! plain per-sample [`SGD`]: `weight = weight - learning_rate * gradient`.
//!
//! # Example
//!
//! ```
//! use letter_cnn::optimizers::{Optimizer, SGD};
//!
//! let mut optimizer = SGD::new(0.5);
//! let mut weights = vec![1.0, 2.0];
//! optimizer.update(&mut weights, &[0.2, -0.2]);
//! assert!((weights[0] - 0.9).abs() < 1e-6);
//! assert!((weights[1] - 2.1).abs() < 1e-6);
//! ```

pub mod sgd;

pub use sgd::SGD;

/// Core trait for neural network optimizers.
pub trait Optimizer {
    /// Update parameters in place from their gradients.
    ///
    /// # Panics
    ///
    /// Implementations panic if parameters and gradients have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]);

    /// Get the base learning rate.
    fn learning_rate(&self) -> f32;
}
