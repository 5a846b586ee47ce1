//! Numeric kernels for the letter network
//!
//! - ReLU and its derivative
//! - Softmax with max subtraction and an epsilon floor
//! - Cross-entropy loss and the fused softmax + cross-entropy gradient

use crate::tensor::Tensor;

/// Smallest probability a softmax output may take.
///
/// Keeps `-ln(p)` finite for classes the network considers impossible.
pub const PROB_EPSILON: f32 = 1e-7;

/// ReLU: `max(0, x)`.
#[inline]
pub fn relu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// ReLU derivative with respect to the pre-activation.
///
/// The derivative at exactly 0 is 0.
#[inline]
pub fn relu_derivative(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else {
        0.0
    }
}

/// Apply ReLU element-wise, returning a new tensor of the same shape.
pub fn relu_tensor(pre_activation: &Tensor) -> Tensor {
    let data = pre_activation.as_slice().iter().map(|&x| relu(x)).collect();
    Tensor::from_vec(pre_activation.shape(), data)
}

/// Gate an activation gradient through the ReLU derivative of the cached
/// pre-activation.
///
/// # Panics
///
/// Panics if the shapes differ.
pub fn relu_backward(grad_activation: &Tensor, pre_activation: &Tensor) -> Tensor {
    assert_eq!(
        grad_activation.shape(),
        pre_activation.shape(),
        "ReLU gradient shape mismatch"
    );
    let data = grad_activation
        .as_slice()
        .iter()
        .zip(pre_activation.as_slice())
        .map(|(&g, &z)| g * relu_derivative(z))
        .collect();
    Tensor::from_vec(grad_activation.shape(), data)
}

/// Softmax over a flat logit vector.
///
/// Subtracts the maximum before exponentiating so large logits cannot
/// overflow, normalizes by the sum, then floors every probability at
/// [`PROB_EPSILON`].
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let mut max_value = logits[0];
    for &value in logits.iter().skip(1) {
        if value > max_value {
            max_value = value;
        }
    }

    let mut probs: Vec<f32> = logits.iter().map(|&v| (v - max_value).exp()).collect();
    let sum: f32 = probs.iter().sum();

    for p in probs.iter_mut() {
        *p /= sum;
        if *p < PROB_EPSILON {
            *p = PROB_EPSILON;
        }
    }
    probs
}

/// Cross-entropy loss of a probability vector against a class label:
/// `-ln(p[label])`.
///
/// # Panics
///
/// Panics if `label` is out of range.
pub fn cross_entropy_loss(probabilities: &[f32], label: usize) -> f32 {
    assert!(
        label < probabilities.len(),
        "label {} out of range for {} classes",
        label,
        probabilities.len()
    );
    -probabilities[label].max(PROB_EPSILON).ln()
}

/// Gradient of softmax + cross-entropy with respect to the logits.
///
/// Uses the closed form `p - y` where `y` is the one-hot label.
pub fn softmax_cross_entropy_gradient(probabilities: &[f32], label: usize) -> Vec<f32> {
    assert!(
        label < probabilities.len(),
        "label {} out of range for {} classes",
        label,
        probabilities.len()
    );
    probabilities
        .iter()
        .enumerate()
        .map(|(i, &p)| if i == label { p - 1.0 } else { p })
        .collect()
}
