//! Tests for the letter_cnn library surface
//!
//! This file tests the public building blocks used by the network:
//! - DenseLayer: creation, Xavier bounds, forward, parameter updates
//! - Conv2DLayer: creation, output geometry, repeated training steps
//! - Activation functions: relu, softmax, cross-entropy
//! - SimpleRng: determinism and ranges

use approx::assert_relative_eq;
use letter_cnn::layers::{conv_output_size, pool_output_size, Conv2DLayer, DenseLayer, Layer};
use letter_cnn::optimizers::SGD;
use letter_cnn::utils::activations::{cross_entropy_loss, relu, relu_tensor, softmax};
use letter_cnn::utils::rng::xavier_limit;
use letter_cnn::utils::SimpleRng;
use letter_cnn::{Shape, Tensor};

// ============================================================================
// DenseLayer Tests
// ============================================================================

mod dense_layer_tests {
    use super::*;

    #[test]
    fn test_dense_layer_creation() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(3200, 256, &mut rng);

        assert_eq!(layer.input_size(), 3200);
        assert_eq!(layer.output_size(), 256);
        assert_eq!(layer.parameter_count(), 3200 * 256 + 256);
    }

    #[test]
    fn test_dense_layer_xavier_initialization() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(100, 50, &mut rng);
        let limit = xavier_limit(100, 50);

        for &w in layer.weights().as_slice() {
            assert!(w >= -limit && w <= limit, "Weight {} outside Xavier range", w);
        }
        assert!(layer.biases().iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_dense_layer_deterministic() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(12345);

        assert_eq!(
            DenseLayer::new(50, 30, &mut rng1),
            DenseLayer::new(50, 30, &mut rng2)
        );
    }

    #[test]
    fn test_dense_forward_zero_input_gives_biases() {
        let mut rng = SimpleRng::new(42);
        let layer = DenseLayer::new(4, 3, &mut rng);

        let output = layer.forward(&Tensor::vector(vec![0.0; 4]));
        assert_eq!(output.as_slice(), layer.biases());
    }

    #[test]
    fn test_dense_update_moves_against_gradient() {
        let mut rng = SimpleRng::new(42);
        let mut layer = DenseLayer::new(2, 1, &mut rng);
        let before = layer.weights().clone();

        let mut grads = layer.zero_gradients();
        layer.backward(
            &Tensor::vector(vec![1.0, -1.0]),
            &Tensor::vector(vec![0.5]),
            &mut grads,
        );
        layer.update_parameters(&grads, &mut SGD::new(0.1));

        assert_relative_eq!(layer.weights().get(0, 0, 0), before.get(0, 0, 0) - 0.05);
        assert_relative_eq!(layer.weights().get(0, 1, 0), before.get(0, 1, 0) + 0.05);
        assert_relative_eq!(layer.biases()[0], -0.05);
    }
}

// ============================================================================
// Conv2DLayer Tests
// ============================================================================

mod conv2d_layer_tests {
    use super::*;

    #[test]
    fn test_conv2d_parameter_count() {
        let mut rng = SimpleRng::new(42);
        let conv1 = Conv2DLayer::new(Shape::new(50, 50, 1), 16, 5, 1, 0, &mut rng);
        let conv2 = Conv2DLayer::new(Shape::new(23, 23, 16), 32, 3, 1, 0, &mut rng);

        assert_eq!(conv1.parameter_count(), 16 * 25 + 16);
        assert_eq!(conv2.parameter_count(), 32 * 16 * 9 + 32);
        assert_eq!(conv2.output_shape(), Shape::new(21, 21, 32));
    }

    #[test]
    fn test_output_geometry() {
        assert_eq!(conv_output_size(50, 5, 1, 0), Some(46));
        assert_eq!(conv_output_size(28, 3, 1, 1), Some(28));
        assert_eq!(conv_output_size(10, 4, 3, 0), Some(3));
        assert_eq!(conv_output_size(10, 4, 4, 0), None);
        assert_eq!(conv_output_size(2, 3, 1, 0), None);

        assert_eq!(pool_output_size(46, 2, 2), Some(23));
        assert_eq!(pool_output_size(21, 2, 2), Some(10));
        assert_eq!(pool_output_size(1, 2, 2), None);
    }

    #[test]
    fn test_conv2d_with_padding_keeps_size() {
        let mut rng = SimpleRng::new(42);
        let layer = Conv2DLayer::new(Shape::new(4, 4, 1), 2, 3, 1, 1, &mut rng);

        let output = layer.forward(&Tensor::from_vec(Shape::new(4, 4, 1), vec![1.0; 16]));
        assert_eq!(output.shape(), Shape::new(4, 4, 2));
        assert!(output.as_slice().iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_conv2d_training_loop() {
        let mut rng = SimpleRng::new(42);
        let mut layer = Conv2DLayer::new(Shape::new(4, 4, 1), 2, 3, 1, 1, &mut rng);
        let input = Tensor::from_vec(Shape::new(4, 4, 1), vec![1.0; 16]);
        let grad_output = Tensor::from_vec(Shape::new(4, 4, 2), vec![0.1; 32]);
        let mut sgd = SGD::new(0.01);

        let start: f32 = layer.forward(&input).sum();
        for _ in 0..10 {
            let mut grads = layer.zero_gradients();
            layer.backward(&input, &grad_output, &mut grads);
            layer.update_parameters(&grads, &mut sgd);
        }

        // A positive upstream gradient pushes every output down
        assert!(layer.forward(&input).sum() < start);
    }
}

// ============================================================================
// Activation Function Tests
// ============================================================================

mod activation_tests {
    use super::*;

    #[test]
    fn test_relu_values() {
        assert_eq!(relu(-2.0), 0.0);
        assert_eq!(relu(0.0), 0.0);
        assert_eq!(relu(1.5), 1.5);

        let t = relu_tensor(&Tensor::vector(vec![-1.0, 0.0, 3.0]));
        assert_eq!(t.as_slice(), &[0.0, 0.0, 3.0]);
    }

    #[test]
    fn test_softmax_sum_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 4.0]);
        let sum: f32 = probs.iter().sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-6);
        assert!(probs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_softmax_numerical_stability_large() {
        let probs = softmax(&[1000.0, 1000.0]);
        assert_relative_eq!(probs[0], 0.5);
        assert_relative_eq!(probs[1], 0.5);
    }

    #[test]
    fn test_cross_entropy_is_clamped() {
        assert_relative_eq!(cross_entropy_loss(&[0.25, 0.75], 1), -(0.75f32).ln());
        assert_relative_eq!(cross_entropy_loss(&[0.0, 1.0], 0), -(1e-7f32).ln());
    }
}

// ============================================================================
// SimpleRng Tests
// ============================================================================

mod rng_tests {
    use super::*;

    #[test]
    fn test_rng_different_seeds() {
        let mut rng1 = SimpleRng::new(1);
        let mut rng2 = SimpleRng::new(2);

        let vals1: Vec<u32> = (0..10).map(|_| rng1.next_u32()).collect();
        let vals2: Vec<u32> = (0..10).map(|_| rng2.next_u32()).collect();
        assert_ne!(vals1, vals2);
    }

    #[test]
    fn test_rng_gen_range_f32() {
        let mut rng = SimpleRng::new(67890);
        for _ in 0..10000 {
            let val = rng.gen_range_f32(-5.0, 5.0);
            assert!((-5.0..=5.0).contains(&val));
        }
    }
}
