//! Max pooling layer.
//!
//! No learned parameters. The forward pass records, for every output cell, the
//! input coordinate that held the window maximum; the backward pass routes each
//! output gradient to exactly that cell.

use crate::tensor::{Shape, Tensor};

/// Output size of a pooling window sweep along one axis.
///
/// Trailing rows/columns that do not fill a whole window are dropped.
pub fn pool_output_size(input_size: usize, pool_size: usize, stride: usize) -> Option<usize> {
    if stride == 0 || pool_size == 0 || pool_size > input_size {
        return None;
    }
    Some((input_size - pool_size) / stride + 1)
}

/// Argmax coordinates recorded by [`MaxPoolLayer::forward`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolArgmax {
    shape: Shape,
    cells: Vec<(usize, usize)>,
}

impl PoolArgmax {
    /// Shape of the pooled output these coordinates belong to.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Input `(row, col)` that produced output cell `(row, col, depth)`.
    pub fn source(&self, row: usize, col: usize, depth: usize) -> (usize, usize) {
        assert!(
            row < self.shape.rows && col < self.shape.cols && depth < self.shape.depth,
            "argmax index ({}, {}, {}) out of bounds for {}",
            row,
            col,
            depth,
            self.shape
        );
        self.cells[(depth * self.shape.rows + row) * self.shape.cols + col]
    }
}

/// Max pooling over square windows, applied per channel.
///
/// # Example
///
/// ```
/// use letter_cnn::layers::MaxPoolLayer;
/// use letter_cnn::Shape;
///
/// let pool = MaxPoolLayer::new(Shape::new(21, 21, 32), 2, 2);
/// assert_eq!(pool.output_shape(), Shape::new(10, 10, 32));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaxPoolLayer {
    input_shape: Shape,
    output_shape: Shape,
    pool_size: usize,
    stride: usize,
}

impl MaxPoolLayer {
    /// # Panics
    ///
    /// Panics if the window does not fit the input or the stride is zero.
    pub fn new(input_shape: Shape, pool_size: usize, stride: usize) -> Self {
        let rows = pool_output_size(input_shape.rows, pool_size, stride);
        let cols = pool_output_size(input_shape.cols, pool_size, stride);
        let (rows, cols) = match (rows, cols) {
            (Some(r), Some(c)) => (r, c),
            _ => panic!(
                "invalid pooling geometry: input {}, window {}, stride {}",
                input_shape, pool_size, stride
            ),
        };
        Self {
            input_shape,
            output_shape: Shape::new(rows, cols, input_shape.depth),
            pool_size,
            stride,
        }
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    pub fn output_shape(&self) -> Shape {
        self.output_shape
    }

    /// Pool `input`, returning the maxima and where they came from.
    ///
    /// Ties keep the first cell in row-major window order.
    pub fn forward(&self, input: &Tensor) -> (Tensor, PoolArgmax) {
        assert_eq!(input.shape(), self.input_shape, "pool input shape mismatch");
        let mut output = Tensor::zeros_shaped(self.output_shape);
        let mut cells = Vec::with_capacity(self.output_shape.len());

        for d in 0..self.output_shape.depth {
            for i in 0..self.output_shape.rows {
                for j in 0..self.output_shape.cols {
                    let mut best = f32::NEG_INFINITY;
                    let mut best_cell = (i * self.stride, j * self.stride);
                    for pi in 0..self.pool_size {
                        for pj in 0..self.pool_size {
                            let r = i * self.stride + pi;
                            let c = j * self.stride + pj;
                            let value = input.get(r, c, d);
                            if value > best {
                                best = value;
                                best_cell = (r, c);
                            }
                        }
                    }
                    output.set(i, j, d, best);
                    cells.push(best_cell);
                }
            }
        }

        let argmax = PoolArgmax {
            shape: self.output_shape,
            cells,
        };
        (output, argmax)
    }

    /// Route each output gradient to its recorded argmax cell.
    ///
    /// Overlapping windows (stride < pool size) accumulate additively.
    pub fn backward(&self, grad_output: &Tensor, argmax: &PoolArgmax) -> Tensor {
        assert_eq!(
            grad_output.shape(),
            self.output_shape,
            "pool output gradient shape mismatch"
        );
        assert_eq!(argmax.shape(), self.output_shape, "pool argmax shape mismatch");
        let mut grad_input = Tensor::zeros_shaped(self.input_shape);

        for d in 0..self.output_shape.depth {
            for i in 0..self.output_shape.rows {
                for j in 0..self.output_shape.cols {
                    let (r, c) = argmax.source(i, j, d);
                    grad_input.add_at(r, c, d, grad_output.get(i, j, d));
                }
            }
        }
        grad_input
    }
}
