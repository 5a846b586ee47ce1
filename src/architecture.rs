//! Architecture configuration structures
//!
//! The letter network is always conv → ReLU → pool → conv → ReLU → pool →
//! flatten → dense → ReLU → dense → softmax. This module describes the sizes of
//! those stages so they can be read from JSON, and checks that they chain into
//! whole-number shapes before any layer is built.

use crate::error::{OcrError, Result};
use crate::layers::{conv_output_size, pool_output_size};
use crate::tensor::Shape;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Convolution stage settings.
///
/// ```json
/// { "filters": 16, "kernel_size": 5, "stride": 1, "padding": 0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConvConfig {
    /// Number of filters (output channels)
    pub filters: usize,
    /// Square kernel side
    pub kernel_size: usize,
    /// Step between receptive windows (default: 1)
    #[serde(default = "default_stride")]
    pub stride: usize,
    /// Zero-padding on every side (default: 0)
    #[serde(default)]
    pub padding: usize,
}

fn default_stride() -> usize {
    1
}

/// Max pooling stage settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    pub size: usize,
    pub stride: usize,
}

/// Sizes of every stage of the letter network.
///
/// Missing JSON fields fall back to the canonical letter architecture:
///
/// ```json
/// {
///   "input_height": 50,
///   "input_width": 50,
///   "conv1": { "filters": 16, "kernel_size": 5 },
///   "pool1": { "size": 2, "stride": 2 },
///   "conv2": { "filters": 32, "kernel_size": 3 },
///   "pool2": { "size": 2, "stride": 2 },
///   "hidden_size": 256,
///   "num_classes": 26
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ArchitectureConfig {
    pub input_height: usize,
    pub input_width: usize,
    pub conv1: ConvConfig,
    pub pool1: PoolConfig,
    pub conv2: ConvConfig,
    pub pool2: PoolConfig,
    /// Width of the ReLU dense layer after flattening
    pub hidden_size: usize,
    /// Number of output classes
    pub num_classes: usize,
}

impl Default for ArchitectureConfig {
    fn default() -> Self {
        Self {
            input_height: 50,
            input_width: 50,
            conv1: ConvConfig {
                filters: 16,
                kernel_size: 5,
                stride: 1,
                padding: 0,
            },
            pool1: PoolConfig { size: 2, stride: 2 },
            conv2: ConvConfig {
                filters: 32,
                kernel_size: 3,
                stride: 1,
                padding: 0,
            },
            pool2: PoolConfig { size: 2, stride: 2 },
            hidden_size: 256,
            num_classes: 26,
        }
    }
}

/// Output shape of every stage, as computed by [`ArchitectureConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageShapes {
    pub input: Shape,
    pub conv1: Shape,
    pub pool1: Shape,
    pub conv2: Shape,
    pub pool2: Shape,
    /// Length of the flattened `pool2` output
    pub flatten: usize,
    pub hidden: usize,
    pub output: usize,
}

impl ArchitectureConfig {
    /// Compute every stage's shape, rejecting geometry that does not chain.
    ///
    /// # Errors
    ///
    /// Returns [`OcrError::Config`] for zero sizes, convolutions whose output
    /// size is not a whole number, and pooling windows larger than their input.
    ///
    /// # Example
    ///
    /// ```
    /// use letter_cnn::architecture::ArchitectureConfig;
    ///
    /// let shapes = ArchitectureConfig::default().validate().unwrap();
    /// assert_eq!(shapes.flatten, 3200);
    /// ```
    pub fn validate(&self) -> Result<StageShapes> {
        if self.input_height == 0 || self.input_width == 0 {
            return Err(config_error("input dimensions must be greater than 0"));
        }
        if self.hidden_size == 0 {
            return Err(config_error("hidden_size must be greater than 0"));
        }
        if self.num_classes < 2 {
            return Err(config_error("num_classes must be at least 2"));
        }

        let input = Shape::new(self.input_height, self.input_width, 1);
        let conv1 = conv_shape("conv1", input, &self.conv1)?;
        let pool1 = pool_shape("pool1", conv1, &self.pool1)?;
        let conv2 = conv_shape("conv2", pool1, &self.conv2)?;
        let pool2 = pool_shape("pool2", conv2, &self.pool2)?;

        Ok(StageShapes {
            input,
            conv1,
            pool1,
            conv2,
            pool2,
            flatten: pool2.len(),
            hidden: self.hidden_size,
            output: self.num_classes,
        })
    }
}

fn config_error(message: impl Into<String>) -> OcrError {
    OcrError::Config(message.into())
}

fn conv_shape(name: &str, input: Shape, conv: &ConvConfig) -> Result<Shape> {
    if conv.filters == 0 {
        return Err(config_error(format!("{}: filters must be greater than 0", name)));
    }
    let rows = conv_output_size(input.rows, conv.kernel_size, conv.stride, conv.padding);
    let cols = conv_output_size(input.cols, conv.kernel_size, conv.stride, conv.padding);
    match (rows, cols) {
        (Some(rows), Some(cols)) => Ok(Shape::new(rows, cols, conv.filters)),
        _ => Err(config_error(format!(
            "{}: kernel {} with stride {} and padding {} does not tile input {}",
            name, conv.kernel_size, conv.stride, conv.padding, input
        ))),
    }
}

fn pool_shape(name: &str, input: Shape, pool: &PoolConfig) -> Result<Shape> {
    let rows = pool_output_size(input.rows, pool.size, pool.stride);
    let cols = pool_output_size(input.cols, pool.size, pool.stride);
    match (rows, cols) {
        (Some(rows), Some(cols)) => Ok(Shape::new(rows, cols, input.depth)),
        _ => Err(config_error(format!(
            "{}: window {} with stride {} does not fit input {}",
            name, pool.size, pool.stride, input
        ))),
    }
}

/// Loads an architecture configuration from a JSON file and validates it.
///
/// # Examples
///
/// ```no_run
/// use letter_cnn::architecture::load_architecture;
///
/// let arch = load_architecture("config/letters.json").unwrap();
/// assert_eq!(arch.num_classes, 26);
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| OcrError::io(path, e))?;
    let config: ArchitectureConfig = serde_json::from_str(&contents)
        .map_err(|e| config_error(format!("{}: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_letter_architecture() {
        let shapes = ArchitectureConfig::default().validate().unwrap();

        assert_eq!(shapes.conv1, Shape::new(46, 46, 16));
        assert_eq!(shapes.pool1, Shape::new(23, 23, 16));
        assert_eq!(shapes.conv2, Shape::new(21, 21, 32));
        assert_eq!(shapes.pool2, Shape::new(10, 10, 32));
        assert_eq!(shapes.flatten, 3200);
        assert_eq!(shapes.hidden, 256);
        assert_eq!(shapes.output, 26);
    }

    #[test]
    fn test_fractional_convolution_rejected() {
        let mut arch = ArchitectureConfig::default();
        // (50 - 5) is odd
        arch.conv1.stride = 2;

        let err = arch.validate().unwrap_err();
        assert!(err.to_string().contains("conv1"));
    }

    #[test]
    fn test_oversized_pool_rejected() {
        let mut arch = ArchitectureConfig::default();
        arch.pool2 = PoolConfig {
            size: 30,
            stride: 30,
        };
        assert!(matches!(arch.validate(), Err(OcrError::Config(_))));
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut arch = ArchitectureConfig::default();
        arch.hidden_size = 0;
        assert!(arch.validate().is_err());

        let mut arch = ArchitectureConfig::default();
        arch.conv2.filters = 0;
        assert!(arch.validate().is_err());

        let mut arch = ArchitectureConfig::default();
        arch.num_classes = 1;
        assert!(arch.validate().is_err());
    }

    #[test]
    fn test_load_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "hidden_size": 128, "pool2": {{ "size": 5, "stride": 5 }} }}"#
        )
        .unwrap();

        let arch = load_architecture(file.path()).unwrap();
        let shapes = arch.validate().unwrap();

        assert_eq!(arch.hidden_size, 128);
        assert_eq!(arch.conv1, ArchitectureConfig::default().conv1);
        assert_eq!(shapes.pool2, Shape::new(4, 4, 32));
        assert_eq!(shapes.flatten, 512);
    }

    #[test]
    fn test_conv_stride_defaults_to_one() {
        let conv: ConvConfig = serde_json::from_str(r#"{ "filters": 4, "kernel_size": 3 }"#).unwrap();
        assert_eq!(conv.stride, 1);
        assert_eq!(conv.padding, 0);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            load_architecture(file.path()),
            Err(OcrError::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_architecture("/nonexistent/arch.json"),
            Err(OcrError::Io { .. })
        ));
    }
}
