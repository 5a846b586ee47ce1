//! 2D Convolutional layer implementation
//!
//! Slides `num_filters` filters of shape `kernel_size × kernel_size × in_depth`
//! over the input with configurable stride and zero padding.

use crate::layers::Layer;
use crate::optimizers::Optimizer;
use crate::tensor::{Shape, Tensor};
use crate::utils::SimpleRng;

/// Output size of a convolution along one axis.
///
/// Returns `None` when the geometry does not produce a whole number of
/// positions, when the kernel does not fit, or when the stride is zero.
pub fn conv_output_size(
    input_size: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
) -> Option<usize> {
    let padded = input_size + 2 * padding;
    if stride == 0 || kernel_size == 0 || kernel_size > padded {
        return None;
    }
    let span = padded - kernel_size;
    if span % stride != 0 {
        return None;
    }
    Some(span / stride + 1)
}

/// Parameter gradients of a [`Conv2DLayer`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConvGradients {
    pub filters: Vec<Tensor>,
    pub biases: Vec<f32>,
}

/// 2D Convolutional layer with learnable filters.
///
/// # Fields
///
/// * `input_shape` - Height × width × channels of the input feature map
/// * `num_filters` - Number of output feature maps
/// * `kernel_size` - Square kernel side
/// * `stride` - Step between receptive windows
/// * `padding` - Zero-padding applied on every side
/// * `filters` - One `kernel_size × kernel_size × in_depth` tensor per filter
/// * `biases` - One bias per filter
///
/// # Example
///
/// ```
/// use letter_cnn::layers::{Conv2DLayer, Layer};
/// use letter_cnn::utils::SimpleRng;
/// use letter_cnn::Shape;
///
/// let mut rng = SimpleRng::new(42);
/// let layer = Conv2DLayer::new(Shape::new(50, 50, 1), 16, 5, 1, 0, &mut rng);
/// assert_eq!(layer.output_shape(), Shape::new(46, 46, 16));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Conv2DLayer {
    input_shape: Shape,
    output_shape: Shape,
    num_filters: usize,
    kernel_size: usize,
    stride: usize,
    padding: usize,
    filters: Vec<Tensor>,
    biases: Vec<f32>,
}

impl Conv2DLayer {
    /// Create a new Conv2DLayer with Xavier initialization.
    ///
    /// Weights are sampled from `U(-limit, limit)` with
    /// `limit = sqrt(6 / (fan_in + fan_out))`,
    /// `fan_in = in_depth × kernel_size²` and `fan_out = num_filters × kernel_size²`.
    /// Filters are drawn one after another in storage order. Biases start at zero.
    ///
    /// # Panics
    ///
    /// Panics if the geometry does not give an integer output size.
    pub fn new(
        input_shape: Shape,
        num_filters: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        rng: &mut SimpleRng,
    ) -> Self {
        let out_rows = conv_output_size(input_shape.rows, kernel_size, stride, padding);
        let out_cols = conv_output_size(input_shape.cols, kernel_size, stride, padding);
        let (out_rows, out_cols) = match (out_rows, out_cols) {
            (Some(r), Some(c)) => (r, c),
            _ => panic!(
                "invalid convolution geometry: input {}, kernel {}, stride {}, padding {}",
                input_shape, kernel_size, stride, padding
            ),
        };

        let fan_in = input_shape.depth * kernel_size * kernel_size;
        let fan_out = num_filters * kernel_size * kernel_size;
        let filter_shape = Shape::new(kernel_size, kernel_size, input_shape.depth);

        let filters = (0..num_filters)
            .map(|_| {
                let data = (0..filter_shape.len())
                    .map(|_| rng.xavier(fan_in, fan_out))
                    .collect();
                Tensor::from_vec(filter_shape, data)
            })
            .collect();

        Self {
            input_shape,
            output_shape: Shape::new(out_rows, out_cols, num_filters),
            num_filters,
            kernel_size,
            stride,
            padding,
            filters,
            biases: vec![0.0f32; num_filters],
        }
    }

    pub fn num_filters(&self) -> usize {
        self.num_filters
    }

    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn filters(&self) -> &[Tensor] {
        &self.filters
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Input coordinate covered by kernel offset `(ki, kj)` at output `(i, j)`,
    /// or `None` when it falls in the zero padding.
    #[inline]
    fn source(&self, i: usize, j: usize, ki: usize, kj: usize) -> Option<(usize, usize)> {
        let row = (i * self.stride + ki) as isize - self.padding as isize;
        let col = (j * self.stride + kj) as isize - self.padding as isize;
        if row < 0
            || col < 0
            || row >= self.input_shape.rows as isize
            || col >= self.input_shape.cols as isize
        {
            None
        } else {
            Some((row as usize, col as usize))
        }
    }

    fn check_shapes(&self, input: &Tensor, grad_output: &Tensor) {
        assert_eq!(input.shape(), self.input_shape, "conv input shape mismatch");
        assert_eq!(
            grad_output.shape(),
            self.output_shape,
            "conv output gradient shape mismatch"
        );
    }

    /// Accumulate filter and bias gradients only.
    ///
    /// Used for the first layer, whose input gradient is never consumed.
    pub fn accumulate_gradients(
        &self,
        input: &Tensor,
        grad_output: &Tensor,
        grads: &mut ConvGradients,
    ) {
        self.check_shapes(input, grad_output);
        let k = self.kernel_size;

        for f in 0..self.num_filters {
            for i in 0..self.output_shape.rows {
                for j in 0..self.output_shape.cols {
                    let g = grad_output.get(i, j, f);
                    grads.biases[f] += g;
                    for c in 0..self.input_shape.depth {
                        for ki in 0..k {
                            for kj in 0..k {
                                if let Some((r, col)) = self.source(i, j, ki, kj) {
                                    grads.filters[f].add_at(ki, kj, c, g * input.get(r, col, c));
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    /// Gradient with respect to the input.
    ///
    /// Every input cell receives `grad · weight` from each output position whose
    /// receptive field covers it.
    pub fn input_gradient(&self, grad_output: &Tensor) -> Tensor {
        assert_eq!(
            grad_output.shape(),
            self.output_shape,
            "conv output gradient shape mismatch"
        );
        let k = self.kernel_size;
        let mut grad_input = Tensor::zeros_shaped(self.input_shape);

        for f in 0..self.num_filters {
            let filter = &self.filters[f];
            for i in 0..self.output_shape.rows {
                for j in 0..self.output_shape.cols {
                    let g = grad_output.get(i, j, f);
                    for c in 0..self.input_shape.depth {
                        for ki in 0..k {
                            for kj in 0..k {
                                if let Some((r, col)) = self.source(i, j, ki, kj) {
                                    grad_input.add_at(r, col, c, g * filter.get(ki, kj, c));
                                }
                            }
                        }
                    }
                }
            }
        }
        grad_input
    }
}

impl Layer for Conv2DLayer {
    type Gradients = ConvGradients;

    fn forward(&self, input: &Tensor) -> Tensor {
        assert_eq!(input.shape(), self.input_shape, "conv input shape mismatch");
        let k = self.kernel_size;
        let mut output = Tensor::zeros_shaped(self.output_shape);

        for f in 0..self.num_filters {
            let filter = &self.filters[f];
            for i in 0..self.output_shape.rows {
                for j in 0..self.output_shape.cols {
                    let mut sum = self.biases[f];
                    for c in 0..self.input_shape.depth {
                        for ki in 0..k {
                            for kj in 0..k {
                                if let Some((r, col)) = self.source(i, j, ki, kj) {
                                    sum += input.get(r, col, c) * filter.get(ki, kj, c);
                                }
                            }
                        }
                    }
                    output.set(i, j, f, sum);
                }
            }
        }
        output
    }

    fn backward(&self, input: &Tensor, grad_output: &Tensor, grads: &mut ConvGradients) -> Tensor {
        self.accumulate_gradients(input, grad_output, grads);
        self.input_gradient(grad_output)
    }

    fn zero_gradients(&self) -> ConvGradients {
        ConvGradients {
            filters: self
                .filters
                .iter()
                .map(|f| Tensor::zeros_shaped(f.shape()))
                .collect(),
            biases: vec![0.0f32; self.num_filters],
        }
    }

    fn update_parameters(&mut self, grads: &ConvGradients, optimizer: &mut dyn Optimizer) {
        assert_eq!(grads.filters.len(), self.filters.len(), "filter count mismatch");
        for (filter, grad) in self.filters.iter_mut().zip(&grads.filters) {
            optimizer.update(filter.as_mut_slice(), grad.as_slice());
        }
        optimizer.update(&mut self.biases, &grads.biases);
    }

    fn input_shape(&self) -> Shape {
        self.input_shape
    }

    fn output_shape(&self) -> Shape {
        self.output_shape
    }

    fn parameter_count(&self) -> usize {
        self.filters.iter().map(Tensor::len).sum::<usize>() + self.biases.len()
    }

    /// Each filter's weights (channel, row, column order) followed by its bias.
    fn write_parameters(&self, out: &mut Vec<f32>) {
        for (filter, &bias) in self.filters.iter().zip(&self.biases) {
            out.extend_from_slice(filter.as_slice());
            out.push(bias);
        }
    }

    fn read_parameters(&mut self, values: &[f32]) -> usize {
        assert!(
            values.len() >= self.parameter_count(),
            "not enough values for conv layer parameters"
        );
        let mut pos = 0;
        for (filter, bias) in self.filters.iter_mut().zip(self.biases.iter_mut()) {
            let n = filter.len();
            filter.as_mut_slice().copy_from_slice(&values[pos..pos + n]);
            pos += n;
            *bias = values[pos];
            pos += 1;
        }
        pos
    }
}
