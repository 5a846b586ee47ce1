//! Shared utilities for the letter network
//!
//! This module provides the seeded random number generator used for weight
//! initialization and shuffling, and the numeric kernels (ReLU, softmax, loss).

pub mod activations;
pub mod rng;

pub use rng::SimpleRng;
