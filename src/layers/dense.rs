//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that performs the transformation:
//! output = act(W × input + b)

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor, Vector1D};
use crate::utils::Activation;

/// Dense (fully connected) layer with weights and biases.
///
/// Performs y = act(Wx + b) where W is stored row-major as
/// (output_size × input_size): row `i` holds the weights of output neuron `i`
/// and column `j` multiplies input feature `j`.
///
/// # Fields
///
/// * `input_size` - Number of input features (weight matrix columns)
/// * `output_size` - Number of output neurons (weight matrix rows)
/// * `weights` - Weight matrix stored row-major (output_size × input_size)
/// * `biases` - Bias vector (output_size)
///
/// # Example
///
/// ```ignore
/// use cnn_inference::layers::DenseLayer;
///
/// let layer = DenseLayer::new(vec![1.0, 0.0, 0.0, 1.0], vec![0.0, 0.0], 2, 2)?;
/// assert_eq!(layer.input_size(), 2);
/// assert_eq!(layer.output_size(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    activation: Activation,
}

impl DenseLayer {
    /// Create a DenseLayer from a row-major weight matrix, with ReLU activation.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` for a zero-sized matrix; `ShapeMismatch` if the weight
    /// or bias length disagrees with the declared sizes.
    pub fn new(
        weights: Vec<f32>,
        biases: Vec<f32>,
        input_size: usize,
        output_size: usize,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(CnnError::invalid_config(format!(
                "dense layer sizes must be positive, got {} -> {}",
                input_size, output_size
            )));
        }
        if weights.len() != input_size * output_size {
            return Err(CnnError::shape_mismatch(
                "dense weight matrix",
                format!("{}x{}", output_size, input_size),
                format!("{} values", weights.len()),
            ));
        }
        if biases.len() != output_size {
            return Err(CnnError::shape_mismatch(
                "dense bias count",
                output_size,
                biases.len(),
            ));
        }

        Ok(Self {
            input_size,
            output_size,
            weights,
            biases,
            activation: Activation::default(),
        })
    }

    /// Create a DenseLayer from one weight row per output neuron.
    pub fn from_rows(rows: Vec<Vec<f32>>, biases: Vec<f32>) -> Result<Self> {
        let output_size = rows.len();
        let input_size = rows.first().map_or(0, Vec::len);

        let mut weights = Vec::with_capacity(output_size * input_size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != input_size {
                return Err(CnnError::shape_mismatch(
                    format!("dense weight row {}", i),
                    input_size,
                    row.len(),
                ));
            }
            weights.extend(row);
        }

        Self::new(weights, biases, input_size, output_size)
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Get the input size of the layer.
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Get the output size of the layer.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn forward(&self, input: &Vector1D) -> Result<Vector1D> {
        if input.len() != self.input_size {
            return Err(CnnError::shape_mismatch(
                "dense input length",
                self.input_size,
                input.len(),
            ));
        }

        let x = input.as_slice();
        let output = self
            .weights
            .chunks_exact(self.input_size)
            .zip(&self.biases)
            .map(|(row, &bias)| {
                let mut sum = bias;
                for (w, v) in row.iter().zip(x) {
                    sum += w * v;
                }
                self.activation.apply(sum)
            })
            .collect();

        Ok(Vector1D::from_vec(output))
    }
}

impl Layer for DenseLayer {
    fn name(&self) -> &'static str {
        "dense"
    }

    fn output_shape(&self, input: &Shape) -> Result<Shape> {
        match *input {
            Shape::Flat(len) if len == self.input_size => Ok(Shape::Flat(self.output_size)),
            _ => Err(CnnError::shape_mismatch(
                "dense input",
                Shape::Flat(self.input_size),
                input,
            )),
        }
    }

    fn forward_tensor(&self, input: Tensor) -> Result<Tensor> {
        let input = input.into_flat("dense input")?;
        let output = self.forward(&input)?;
        tracing::debug!(input = input.len(), output = output.len(), "dense forward");
        Ok(Tensor::Flat(output))
    }

    /// Returns input_size × output_size (weights) + output_size (biases).
    fn parameter_count(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
