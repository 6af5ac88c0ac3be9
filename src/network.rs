//! Network: the ordered chain of pipeline stages.
//!
//! ```text
//! Input → Stage[0] → Stage[1] → ... → Stage[N-1] → scores
//! ```
//!
//! Each stage declares its output shape, so the whole chain is validated as
//! it is assembled, before any data flows through it.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor, Tensor3D, Vector1D};

struct Stage {
    label: String,
    layer: Box<dyn Layer>,
    output_shape: Shape,
}

/// Emitted after every stage of [`Network::forward_with`].
pub struct StageReport<'a> {
    pub index: usize,
    pub label: &'a str,
    pub kind: &'static str,
    pub output: &'a Tensor,
}

/// Sequential network: stages run in insertion order, each output feeding
/// the next stage unchanged.
pub struct Network {
    input_shape: Shape,
    stages: Vec<Stage>,
}

impl Network {
    /// Empty network accepting tensors of `input_shape`.
    pub fn new(input_shape: Shape) -> Self {
        Self {
            input_shape,
            stages: Vec::new(),
        }
    }

    /// Append a stage. Fails if the layer cannot accept the current output
    /// shape of the chain.
    pub fn push(&mut self, label: impl Into<String>, layer: Box<dyn Layer>) -> Result<Shape> {
        let label = label.into();
        let output_shape = layer.output_shape(&self.output_shape()).map_err(|e| match e {
            CnnError::ShapeMismatch {
                context,
                expected,
                actual,
            } => CnnError::ShapeMismatch {
                context: format!("{}: {}", label, context),
                expected,
                actual,
            },
            CnnError::InvalidConfig(msg) => CnnError::InvalidConfig(format!("{}: {}", label, msg)),
            other => other,
        })?;

        self.stages.push(Stage {
            label,
            layer,
            output_shape,
        });
        Ok(output_shape)
    }

    pub fn with_stage(mut self, label: impl Into<String>, layer: Box<dyn Layer>) -> Result<Self> {
        self.push(label, layer)?;
        Ok(self)
    }

    pub fn input_shape(&self) -> Shape {
        self.input_shape
    }

    /// Shape of the final stage's output (the input shape for an empty network).
    pub fn output_shape(&self) -> Shape {
        self.stages
            .last()
            .map_or(self.input_shape, |stage| stage.output_shape)
    }

    /// Output shape of each stage, in order.
    pub fn stage_shapes(&self) -> Vec<Shape> {
        self.stages.iter().map(|s| s.output_shape).collect()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.stages.iter().map(|s| s.layer.parameter_count()).sum()
    }

    /// Run the forward pass and return the final score vector.
    pub fn forward(&self, input: Tensor3D) -> Result<Vector1D> {
        self.forward_with(input, |_| {})
    }

    /// Run the forward pass, calling `observer` after every stage.
    pub fn forward_with<F>(&self, input: Tensor3D, mut observer: F) -> Result<Vector1D>
    where
        F: FnMut(&StageReport<'_>),
    {
        if input.shape() != self.input_shape {
            return Err(CnnError::shape_mismatch(
                "network input",
                self.input_shape,
                input.shape(),
            ));
        }

        let mut current = Tensor::Spatial(input);
        for (index, stage) in self.stages.iter().enumerate() {
            current = stage.layer.forward_tensor(current)?;
            tracing::debug!(stage = %stage.label, shape = %current.shape(), "stage complete");
            observer(&StageReport {
                index,
                label: &stage.label,
                kind: stage.layer.name(),
                output: &current,
            });
        }

        current.into_flat("network output")
    }
}
