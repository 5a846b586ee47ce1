//! The letter network: two convolution + pooling stages, flatten, two dense layers.
//!
//! ```text
//! input ─ conv1 ─ ReLU ─ pool1 ─ conv2 ─ ReLU ─ pool2 ─ flatten ─ fc1 ─ ReLU ─ fc2 ─ softmax
//! ```
//!
//! [`Network::forward`] returns a [`ForwardCache`] holding every intermediate
//! value of one sample; [`Network::backward`] consumes that cache and produces a
//! fresh [`Gradients`] value. Neither is stored inside the network, so several
//! samples or several networks never share state.

use crate::architecture::ArchitectureConfig;
use crate::error::{ModelFileError, Result};
use crate::layers::{
    Conv2DLayer, ConvGradients, DenseGradients, DenseLayer, Layer, MaxPoolLayer, PoolArgmax,
};
use crate::optimizers::Optimizer;
use crate::tensor::{Shape, Tensor};
use crate::utils::activations::{
    cross_entropy_loss, relu_backward, relu_tensor, softmax, softmax_cross_entropy_gradient,
};
use crate::utils::SimpleRng;

/// Everything computed during one forward pass.
#[derive(Debug, Clone)]
pub struct ForwardCache {
    pub input: Tensor,
    pub conv1_pre: Tensor,
    pub conv1_out: Tensor,
    pub pool1_out: Tensor,
    pub pool1_argmax: PoolArgmax,
    pub conv2_pre: Tensor,
    pub conv2_out: Tensor,
    pub pool2_out: Tensor,
    pub pool2_argmax: PoolArgmax,
    /// `pool2_out` reshaped to a vector
    pub flattened: Tensor,
    pub fc1_pre: Tensor,
    pub fc1_out: Tensor,
    pub logits: Tensor,
    pub probabilities: Vec<f32>,
}

impl ForwardCache {
    /// Most probable class; the lowest index wins ties.
    pub fn predicted(&self) -> usize {
        let mut best = 0usize;
        for (i, &p) in self.probabilities.iter().enumerate().skip(1) {
            if p > self.probabilities[best] {
                best = i;
            }
        }
        best
    }

    /// Cross-entropy loss of this pass against `label`.
    pub fn loss(&self, label: usize) -> f32 {
        cross_entropy_loss(&self.probabilities, label)
    }
}

/// Gradients for every learned parameter of a [`Network`].
#[derive(Debug, Clone, PartialEq)]
pub struct Gradients {
    pub conv1: ConvGradients,
    pub conv2: ConvGradients,
    pub fc1: DenseGradients,
    pub fc2: DenseGradients,
}

impl Gradients {
    /// Flatten in the same order as [`Network::parameters`].
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = Vec::new();
        for conv in [&self.conv1, &self.conv2] {
            for (filter, &bias) in conv.filters.iter().zip(&conv.biases) {
                out.extend_from_slice(filter.as_slice());
                out.push(bias);
            }
        }
        for dense in [&self.fc1, &self.fc2] {
            let cols = dense.weights.cols();
            for (row, &bias) in dense.weights.as_slice().chunks(cols).zip(&dense.biases) {
                out.extend_from_slice(row);
                out.push(bias);
            }
        }
        out
    }
}

/// The letter classifier network.
///
/// # Example
///
/// ```
/// use letter_cnn::utils::SimpleRng;
/// use letter_cnn::{Network, Tensor};
///
/// let mut rng = SimpleRng::new(42);
/// let network = Network::letters(&mut rng);
/// let cache = network.forward(&Tensor::zeros(50, 50, 1));
///
/// assert_eq!(cache.probabilities.len(), 26);
/// assert_eq!(network.parameter_count(), 830_194);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    architecture: ArchitectureConfig,
    conv1: Conv2DLayer,
    pool1: MaxPoolLayer,
    conv2: Conv2DLayer,
    pool2: MaxPoolLayer,
    fc1: DenseLayer,
    fc2: DenseLayer,
}

impl Network {
    /// Build a randomly initialized network for `architecture`.
    ///
    /// Layers draw their weights from `rng` in the order conv1, conv2, fc1, fc2.
    pub fn new(architecture: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<Self> {
        architecture.validate()?;
        Ok(Self::build(architecture.clone(), rng))
    }

    /// The canonical 50×50 → 26 letter network.
    pub fn letters(rng: &mut SimpleRng) -> Self {
        Self::build(ArchitectureConfig::default(), rng)
    }

    fn build(architecture: ArchitectureConfig, rng: &mut SimpleRng) -> Self {
        let input = Shape::new(architecture.input_height, architecture.input_width, 1);
        let c1 = architecture.conv1;
        let conv1 = Conv2DLayer::new(input, c1.filters, c1.kernel_size, c1.stride, c1.padding, rng);
        let pool1 = MaxPoolLayer::new(
            conv1.output_shape(),
            architecture.pool1.size,
            architecture.pool1.stride,
        );
        let c2 = architecture.conv2;
        let conv2 = Conv2DLayer::new(
            pool1.output_shape(),
            c2.filters,
            c2.kernel_size,
            c2.stride,
            c2.padding,
            rng,
        );
        let pool2 = MaxPoolLayer::new(
            conv2.output_shape(),
            architecture.pool2.size,
            architecture.pool2.stride,
        );
        let fc1 = DenseLayer::new(pool2.output_shape().len(), architecture.hidden_size, rng);
        let fc2 = DenseLayer::new(architecture.hidden_size, architecture.num_classes, rng);

        Self {
            architecture,
            conv1,
            pool1,
            conv2,
            pool2,
            fc1,
            fc2,
        }
    }

    pub fn architecture(&self) -> &ArchitectureConfig {
        &self.architecture
    }

    pub fn input_shape(&self) -> Shape {
        self.conv1.input_shape()
    }

    pub fn num_classes(&self) -> usize {
        self.fc2.output_size()
    }

    pub fn conv1(&self) -> &Conv2DLayer {
        &self.conv1
    }

    pub fn conv2(&self) -> &Conv2DLayer {
        &self.conv2
    }

    pub fn fc1(&self) -> &DenseLayer {
        &self.fc1
    }

    pub fn fc2(&self) -> &DenseLayer {
        &self.fc2
    }

    /// Run the full forward pass, keeping every intermediate value.
    ///
    /// # Panics
    ///
    /// Panics if `input` does not match [`Network::input_shape`].
    pub fn forward(&self, input: &Tensor) -> ForwardCache {
        assert_eq!(
            input.shape(),
            self.input_shape(),
            "network input shape mismatch"
        );

        let conv1_pre = self.conv1.forward(input);
        let conv1_out = relu_tensor(&conv1_pre);
        let (pool1_out, pool1_argmax) = self.pool1.forward(&conv1_out);

        let conv2_pre = self.conv2.forward(&pool1_out);
        let conv2_out = relu_tensor(&conv2_pre);
        let (pool2_out, pool2_argmax) = self.pool2.forward(&conv2_out);

        let flattened = pool2_out.clone().reshape(Shape::vector(pool2_out.len()));
        let fc1_pre = self.fc1.forward(&flattened);
        let fc1_out = relu_tensor(&fc1_pre);
        let logits = self.fc2.forward(&fc1_out);
        let probabilities = softmax(logits.as_slice());

        ForwardCache {
            input: input.clone(),
            conv1_pre,
            conv1_out,
            pool1_out,
            pool1_argmax,
            conv2_pre,
            conv2_out,
            pool2_out,
            pool2_argmax,
            flattened,
            fc1_pre,
            fc1_out,
            logits,
            probabilities,
        }
    }

    /// Class probabilities for `input`.
    pub fn probabilities(&self, input: &Tensor) -> Vec<f32> {
        self.forward(input).probabilities
    }

    /// Most probable class for `input`; the lowest index wins ties.
    pub fn predict(&self, input: &Tensor) -> usize {
        self.forward(input).predicted()
    }

    pub fn loss(&self, input: &Tensor, label: usize) -> f32 {
        self.forward(input).loss(label)
    }

    /// Zeroed gradients shaped like every parameter.
    pub fn zero_gradients(&self) -> Gradients {
        Gradients {
            conv1: self.conv1.zero_gradients(),
            conv2: self.conv2.zero_gradients(),
            fc1: self.fc1.zero_gradients(),
            fc2: self.fc2.zero_gradients(),
        }
    }

    /// Gradients of the cross-entropy loss of `cache` against `label`.
    pub fn backward(&self, cache: &ForwardCache, label: usize) -> Gradients {
        let mut grads = self.zero_gradients();
        self.accumulate_gradients(cache, label, &mut grads);
        grads
    }

    /// Backpropagate from the closed-form softmax + cross-entropy seed `p − y`,
    /// adding into `grads`.
    ///
    /// # Panics
    ///
    /// Panics if `label` is not a valid class.
    pub fn accumulate_gradients(&self, cache: &ForwardCache, label: usize, grads: &mut Gradients) {
        let d_logits = Tensor::vector(softmax_cross_entropy_gradient(
            &cache.probabilities,
            label,
        ));

        let d_fc1_out = self.fc2.backward(&cache.fc1_out, &d_logits, &mut grads.fc2);
        let d_fc1_pre = relu_backward(&d_fc1_out, &cache.fc1_pre);
        let d_flattened = self.fc1.backward(&cache.flattened, &d_fc1_pre, &mut grads.fc1);

        let d_pool2 = d_flattened.reshape(self.pool2.output_shape());
        let d_conv2_out = self.pool2.backward(&d_pool2, &cache.pool2_argmax);
        let d_conv2_pre = relu_backward(&d_conv2_out, &cache.conv2_pre);
        let d_pool1 = self
            .conv2
            .backward(&cache.pool1_out, &d_conv2_pre, &mut grads.conv2);

        let d_conv1_out = self.pool1.backward(&d_pool1, &cache.pool1_argmax);
        let d_conv1_pre = relu_backward(&d_conv1_out, &cache.conv1_pre);
        // Nothing upstream of conv1 needs an input gradient
        self.conv1
            .accumulate_gradients(&cache.input, &d_conv1_pre, &mut grads.conv1);
    }

    /// Apply one optimizer step to every parameter.
    pub fn apply_gradients(&mut self, grads: &Gradients, optimizer: &mut dyn Optimizer) {
        self.fc2.update_parameters(&grads.fc2, optimizer);
        self.fc1.update_parameters(&grads.fc1, optimizer);
        self.conv2.update_parameters(&grads.conv2, optimizer);
        self.conv1.update_parameters(&grads.conv1, optimizer);
    }

    pub fn parameter_count(&self) -> usize {
        self.conv1.parameter_count()
            + self.conv2.parameter_count()
            + self.fc1.parameter_count()
            + self.fc2.parameter_count()
    }

    /// All parameters in persisted order: conv1, conv2, fc1, fc2.
    pub fn parameters(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.parameter_count());
        self.conv1.write_parameters(&mut out);
        self.conv2.write_parameters(&mut out);
        self.fc1.write_parameters(&mut out);
        self.fc2.write_parameters(&mut out);
        out
    }

    /// Replace every parameter from a flat slice in persisted order.
    ///
    /// # Errors
    ///
    /// Fails without touching the network when `values` has the wrong length.
    pub fn set_parameters(&mut self, values: &[f32]) -> Result<()> {
        let expected = self.parameter_count();
        if values.len() != expected {
            return Err(ModelFileError::CountMismatch {
                expected,
                found: values.len(),
            }
            .into());
        }
        let mut pos = self.conv1.read_parameters(values);
        pos += self.conv2.read_parameters(&values[pos..]);
        pos += self.fc1.read_parameters(&values[pos..]);
        self.fc2.read_parameters(&values[pos..]);
        Ok(())
    }
}
