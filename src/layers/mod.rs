//! Layer abstractions for the inference pipeline
//!
//! This module provides the Layer trait and the four stage types the network
//! is composed of.

mod r#trait;
pub mod conv2d;
pub mod dense;
pub mod flatten;
pub mod pooling;

// Re-export the Layer trait for convenience
pub use conv2d::{Conv2DLayer, FilterBank};
pub use dense::DenseLayer;
pub use flatten::FlattenLayer;
pub use pooling::MaxPool2DLayer;
pub use r#trait::Layer;
