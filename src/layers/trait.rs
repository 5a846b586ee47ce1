//! Layer trait definition for parameterized layers
//!
//! Convolution and dense layers share this interface. Gradients are not stored
//! inside the layer: each layer names its own gradient type, the network
//! creates a zeroed value per training sample, `backward` accumulates into it
//! and `update_parameters` consumes it.

use crate::optimizers::Optimizer;
use crate::tensor::{Shape, Tensor};

/// Core trait for layers with learned parameters.
///
/// # Example
///
/// ```
/// use letter_cnn::layers::{DenseLayer, Layer};
/// use letter_cnn::optimizers::SGD;
/// use letter_cnn::utils::SimpleRng;
/// use letter_cnn::Tensor;
///
/// let mut rng = SimpleRng::new(42);
/// let mut layer = DenseLayer::new(4, 2, &mut rng);
/// let input = Tensor::vector(vec![1.0, 0.0, 0.5, 0.25]);
///
/// let output = layer.forward(&input);
/// let mut grads = layer.zero_gradients();
/// let grad_input = layer.backward(&input, &Tensor::vector(vec![0.1, -0.1]), &mut grads);
/// layer.update_parameters(&grads, &mut SGD::new(0.01));
///
/// assert_eq!(output.len(), 2);
/// assert_eq!(grad_input.len(), 4);
/// ```
pub trait Layer {
    /// Gradient storage mirroring this layer's parameters.
    type Gradients;

    /// Forward propagation, returning the pre-activation output.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not have [`Layer::input_shape`].
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Backward propagation.
    ///
    /// Accumulates parameter gradients into `grads` and returns the gradient of
    /// the loss with respect to `input`.
    ///
    /// # Arguments
    ///
    /// * `input` - The input used in the matching forward pass
    /// * `grad_output` - Gradient of the loss w.r.t. this layer's pre-activation output
    /// * `grads` - Accumulator created by [`Layer::zero_gradients`]
    fn backward(&self, input: &Tensor, grad_output: &Tensor, grads: &mut Self::Gradients)
        -> Tensor;

    /// Zeroed gradient storage shaped like this layer's parameters.
    fn zero_gradients(&self) -> Self::Gradients;

    /// Apply `grads` with the given optimizer.
    fn update_parameters(&mut self, grads: &Self::Gradients, optimizer: &mut dyn Optimizer);

    fn input_shape(&self) -> Shape;

    fn output_shape(&self) -> Shape;

    /// Total count of weights and biases.
    fn parameter_count(&self) -> usize;

    /// Append all parameters in persisted order.
    fn write_parameters(&self, out: &mut Vec<f32>);

    /// Overwrite all parameters from the front of `values` in persisted order.
    ///
    /// Returns the number of values consumed.
    ///
    /// # Panics
    ///
    /// Panics if `values` holds fewer than [`Layer::parameter_count`] values.
    fn read_parameters(&mut self, values: &[f32]) -> usize;
}
