//! Owned 3-D tensors used for images, activations, filters and gradients.
//!
//! Storage is depth-major and row-major inside each depth plane:
//! `index = (depth * rows + row) * cols + col`. Flattening a tensor therefore
//! walks channel by channel, row by row, which is the order the dense layers
//! and the model files expect.

use std::fmt;

/// Dimensions of a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
    pub depth: usize,
}

impl Shape {
    pub const fn new(rows: usize, cols: usize, depth: usize) -> Self {
        Self { rows, cols, depth }
    }

    /// Shape of a flat vector of `len` values (1 × len × 1).
    pub const fn vector(len: usize) -> Self {
        Self::new(1, len, 1)
    }

    /// Total element count.
    pub const fn len(&self) -> usize {
        self.rows * self.cols * self.depth
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.rows, self.cols, self.depth)
    }
}

/// A dense `rows × cols × depth` buffer of `f32`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Zero-filled tensor.
    pub fn zeros(rows: usize, cols: usize, depth: usize) -> Self {
        Self::zeros_shaped(Shape::new(rows, cols, depth))
    }

    pub fn zeros_shaped(shape: Shape) -> Self {
        Self {
            shape,
            data: vec![0.0f32; shape.len()],
        }
    }

    /// Wrap an existing buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not match the shape.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Self {
        assert_eq!(
            data.len(),
            shape.len(),
            "buffer of {} values does not fit shape {}",
            data.len(),
            shape
        );
        Self { shape, data }
    }

    /// Flat vector tensor (1 × n × 1).
    pub fn vector(data: Vec<f32>) -> Self {
        let shape = Shape::vector(data.len());
        Self { shape, data }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn depth(&self) -> usize {
        self.shape.depth
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    fn offset(&self, row: usize, col: usize, depth: usize) -> usize {
        assert!(
            row < self.shape.rows && col < self.shape.cols && depth < self.shape.depth,
            "index ({}, {}, {}) out of bounds for tensor {}",
            row,
            col,
            depth,
            self.shape
        );
        (depth * self.shape.rows + row) * self.shape.cols + col
    }

    /// Value at `(row, col, depth)`.
    #[inline]
    pub fn get(&self, row: usize, col: usize, depth: usize) -> f32 {
        self.data[self.offset(row, col, depth)]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, depth: usize, value: f32) {
        let idx = self.offset(row, col, depth);
        self.data[idx] = value;
    }

    /// Accumulate `value` into `(row, col, depth)`.
    #[inline]
    pub fn add_at(&mut self, row: usize, col: usize, depth: usize, value: f32) {
        let idx = self.offset(row, col, depth);
        self.data[idx] += value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Reinterpret the buffer with a new shape of the same size.
    ///
    /// Used for flatten (3-D → vector) and its inverse during backprop.
    ///
    /// # Panics
    ///
    /// Panics if the element counts differ.
    pub fn reshape(self, shape: Shape) -> Self {
        assert_eq!(
            self.shape.len(),
            shape.len(),
            "cannot reshape {} into {}",
            self.shape,
            shape
        );
        Self {
            shape,
            data: self.data,
        }
    }

    /// Index of the largest value; the first one wins on ties.
    pub fn argmax(&self) -> usize {
        let mut best = 0usize;
        for (i, &value) in self.data.iter().enumerate().skip(1) {
            if value > self.data[best] {
                best = i;
            }
        }
        best
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }
}
