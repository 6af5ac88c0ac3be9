//! Layer trait definition for pipeline stages
//!
//! This module defines the core Layer trait that every stage (Conv2D,
//! MaxPool2D, Flatten, Dense) implements so the network can hold them in one
//! ordered list.

use crate::error::Result;
use crate::tensor::{Shape, Tensor};

/// Core trait for forward-only pipeline stages.
///
/// Parameters are fixed at construction; `forward_tensor` takes `&self`, so
/// one layer can serve concurrent forward passes on different inputs.
///
/// # Example
///
/// ```ignore
/// let shape = layer.output_shape(&Shape::spatial(1, 28, 28))?;
/// let output = layer.forward_tensor(Tensor::Spatial(input))?;
/// assert_eq!(output.shape(), shape);
/// ```
pub trait Layer: Send + Sync {
    /// Short kind name used in logs ("conv2d", "maxpool2d", ...).
    fn name(&self) -> &'static str;

    /// Shape this layer produces for a given input shape, computed without
    /// touching any data.
    ///
    /// Returns an error if the input shape is incompatible with the layer's
    /// configuration.
    fn output_shape(&self, input: &Shape) -> Result<Shape>;

    /// Forward propagation through the layer.
    ///
    /// Consumes the previous stage's output and returns this stage's output.
    fn forward_tensor(&self, input: Tensor) -> Result<Tensor>;

    /// Number of weights plus biases held by the layer.
    fn parameter_count(&self) -> usize;
}
