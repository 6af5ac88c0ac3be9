//! Shared numeric helpers used by every layer: output-size arithmetic,
//! zero padding and activation functions.

pub mod activations;
pub mod shape;

pub use activations::{relu, softmax, Activation};
pub use shape::{output_size, pad2d};
