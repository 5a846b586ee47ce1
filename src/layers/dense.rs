//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer (also known as Linear or Fully Connected layer)
//! that performs the transformation: output = weights · input + biases

use crate::layers::Layer;
use crate::optimizers::Optimizer;
use crate::tensor::{Shape, Tensor};
use crate::utils::SimpleRng;

/// Parameter gradients of a [`DenseLayer`].
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGradients {
    pub weights: Tensor,
    pub biases: Vec<f32>,
}

/// Dense (fully connected) layer with weights and biases.
///
/// Performs the linear transformation: y = Wx + b
/// where x is the flat input vector (input_size),
/// W is the weight matrix (output_size × input_size),
/// and b is the bias vector (output_size).
///
/// # Fields
///
/// * `input_size` - Number of input features
/// * `output_size` - Number of output features
/// * `weights` - One row of `input_size` weights per output unit
/// * `biases` - Bias vector (output_size)
///
/// # Example
///
/// ```
/// use letter_cnn::layers::{DenseLayer, Layer};
/// use letter_cnn::utils::SimpleRng;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = DenseLayer::new(3200, 256, &mut rng);
/// assert_eq!(layer.input_size(), 3200);
/// assert_eq!(layer.output_size(), 256);
/// assert_eq!(layer.parameter_count(), 3200 * 256 + 256);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Tensor,
    biases: Vec<f32>,
}

impl DenseLayer {
    /// Create a new DenseLayer with Xavier initialization.
    ///
    /// Weights are sampled row by row from `U(-limit, limit)` where
    /// `limit = sqrt(6 / (input_size + output_size))`. Biases start at zero.
    pub fn new(input_size: usize, output_size: usize, rng: &mut SimpleRng) -> Self {
        let data = (0..input_size * output_size)
            .map(|_| rng.xavier(input_size, output_size))
            .collect();

        Self {
            input_size,
            output_size,
            weights: Tensor::from_vec(Shape::new(output_size, input_size, 1), data),
            biases: vec![0.0f32; output_size],
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Weight matrix, `output_size` rows by `input_size` columns.
    pub fn weights(&self) -> &Tensor {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    fn row(&self, i: usize) -> &[f32] {
        let start = i * self.input_size;
        &self.weights.as_slice()[start..start + self.input_size]
    }
}

impl Layer for DenseLayer {
    type Gradients = DenseGradients;

    fn forward(&self, input: &Tensor) -> Tensor {
        assert_eq!(
            input.shape(),
            Shape::vector(self.input_size),
            "dense input shape mismatch"
        );
        let x = input.as_slice();
        let output = (0..self.output_size)
            .map(|i| {
                let mut sum = self.biases[i];
                for (w, v) in self.row(i).iter().zip(x) {
                    sum += w * v;
                }
                sum
            })
            .collect();
        Tensor::vector(output)
    }

    fn backward(&self, input: &Tensor, grad_output: &Tensor, grads: &mut DenseGradients) -> Tensor {
        assert_eq!(
            input.shape(),
            Shape::vector(self.input_size),
            "dense input shape mismatch"
        );
        assert_eq!(
            grad_output.shape(),
            Shape::vector(self.output_size),
            "dense output gradient shape mismatch"
        );
        let x = input.as_slice();
        let mut grad_input = vec![0.0f32; self.input_size];

        for (i, &g) in grad_output.as_slice().iter().enumerate() {
            grads.biases[i] += g;
            let start = i * self.input_size;
            let grad_row = &mut grads.weights.as_mut_slice()[start..start + self.input_size];
            for (gw, &v) in grad_row.iter_mut().zip(x) {
                *gw += g * v;
            }
            for (gi, &w) in grad_input.iter_mut().zip(self.row(i)) {
                *gi += g * w;
            }
        }
        Tensor::vector(grad_input)
    }

    fn zero_gradients(&self) -> DenseGradients {
        DenseGradients {
            weights: Tensor::zeros_shaped(self.weights.shape()),
            biases: vec![0.0f32; self.output_size],
        }
    }

    fn update_parameters(&mut self, grads: &DenseGradients, optimizer: &mut dyn Optimizer) {
        optimizer.update(self.weights.as_mut_slice(), grads.weights.as_slice());
        optimizer.update(&mut self.biases, &grads.biases);
    }

    fn input_shape(&self) -> Shape {
        Shape::vector(self.input_size)
    }

    fn output_shape(&self) -> Shape {
        Shape::vector(self.output_size)
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }

    /// Each output row's weights followed by its bias.
    fn write_parameters(&self, out: &mut Vec<f32>) {
        for i in 0..self.output_size {
            out.extend_from_slice(self.row(i));
            out.push(self.biases[i]);
        }
    }

    fn read_parameters(&mut self, values: &[f32]) -> usize {
        assert!(
            values.len() >= self.parameter_count(),
            "not enough values for dense layer parameters"
        );
        let n = self.input_size;
        let mut pos = 0;
        for i in 0..self.output_size {
            self.weights.as_mut_slice()[i * n..(i + 1) * n].copy_from_slice(&values[pos..pos + n]);
            pos += n;
            self.biases[i] = values[pos];
            pos += 1;
        }
        pos
    }
}
