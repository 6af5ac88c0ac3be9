//! Flatten layer: [C, H, W] → [C*H*W].
//!
//! Element order is channel, then row, then column. Any dense layer placed
//! after it indexes its weight columns in exactly that order.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor, Tensor3D, Vector1D};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlattenLayer;

impl FlattenLayer {
    pub fn forward(&self, input: Tensor3D) -> Vector1D {
        input.flatten()
    }
}

impl Layer for FlattenLayer {
    fn name(&self) -> &'static str {
        "flatten"
    }

    fn output_shape(&self, input: &Shape) -> Result<Shape> {
        match input {
            Shape::Spatial { .. } => Ok(Shape::Flat(input.total()?)),
            Shape::Flat(_) => Err(CnnError::shape_mismatch(
                "flatten input",
                "a CxHxW tensor",
                input,
            )),
        }
    }

    fn forward_tensor(&self, input: Tensor) -> Result<Tensor> {
        let input = input.into_spatial("flatten input")?;
        let shape = input.shape();
        let output = self.forward(input);
        tracing::debug!(input = %shape, output = %output.shape(), "flatten forward");
        Ok(Tensor::Flat(output))
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_order() {
        let input = Tensor3D::from_nested(vec![
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![5.0, 6.0], vec![7.0, 8.0]],
        ])
        .unwrap();

        let flat = FlattenLayer.forward(input);

        assert_eq!(flat.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    }

    #[test]
    fn test_flatten_output_shape() {
        let shape = FlattenLayer.output_shape(&Shape::spatial(5, 7, 7)).unwrap();
        assert_eq!(shape, Shape::Flat(245));
    }

    #[test]
    fn test_flatten_rejects_flat_input() {
        let result = FlattenLayer.forward_tensor(Tensor::Flat(Vector1D::zeros(4)));
        assert!(matches!(result, Err(CnnError::ShapeMismatch { .. })));
    }
}
