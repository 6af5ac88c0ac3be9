//! Max pooling layer.
//!
//! Downsamples each channel independently by taking the maximum of every
//! `pool × pool` window. No learnable parameters and no padding: windows that
//! would run past the input edge are never generated.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor, Tensor3D};
use crate::utils::shape::output_size;

/// Max pooling 2D layer.
///
/// Reduces [C, H, W] to [C, H', W'] where H' = (H - pool_size) / stride + 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxPool2DLayer {
    pool_size: usize,
    stride: usize,
}

impl MaxPool2DLayer {
    /// Create a square max pooling layer (e.g. 2×2 with stride 2).
    pub fn new(pool_size: usize, stride: usize) -> Result<Self> {
        if pool_size == 0 {
            return Err(CnnError::invalid_config("pool size must be greater than 0"));
        }
        if stride == 0 {
            return Err(CnnError::invalid_config("pool stride must be greater than 0"));
        }
        Ok(Self { pool_size, stride })
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn output_dims(&self, input_height: usize, input_width: usize) -> Result<(usize, usize)> {
        let out_h = output_size(input_height, self.pool_size, self.stride, 0)?;
        let out_w = output_size(input_width, self.pool_size, self.stride, 0)?;
        Ok((out_h, out_w))
    }

    pub fn forward(&self, input: &Tensor3D) -> Result<Tensor3D> {
        let (in_h, in_w) = (input.height(), input.width());
        let (out_h, out_w) = self.output_dims(in_h, in_w)?;
        let plane = in_h * in_w;

        let mut output = Vec::with_capacity(input.channels() * out_h * out_w);

        for channel in input.as_slice().chunks_exact(plane) {
            for py in 0..out_h {
                for px in 0..out_w {
                    let iy0 = py * self.stride;
                    let ix0 = px * self.stride;

                    let mut best = channel[iy0 * in_w + ix0];
                    for dy in 0..self.pool_size {
                        let row = (iy0 + dy) * in_w + ix0;
                        for &v in &channel[row..row + self.pool_size] {
                            if v > best {
                                best = v;
                            }
                        }
                    }

                    output.push(best);
                }
            }
        }

        Tensor3D::new(input.channels(), out_h, out_w, output)
    }
}

impl Layer for MaxPool2DLayer {
    fn name(&self) -> &'static str {
        "maxpool2d"
    }

    fn output_shape(&self, input: &Shape) -> Result<Shape> {
        match *input {
            Shape::Spatial {
                channels,
                height,
                width,
            } => {
                let (out_h, out_w) = self.output_dims(height, width)?;
                Ok(Shape::spatial(channels, out_h, out_w))
            }
            Shape::Flat(_) => Err(CnnError::shape_mismatch(
                "maxpool2d input",
                "a CxHxW tensor",
                input,
            )),
        }
    }

    fn forward_tensor(&self, input: Tensor) -> Result<Tensor> {
        let input = input.into_spatial("maxpool2d input")?;
        let output = self.forward(&input)?;
        tracing::debug!(input = %input.shape(), output = %output.shape(), "maxpool2d forward");
        Ok(Tensor::Spatial(output))
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maxpool_2x2() {
        let pool = MaxPool2DLayer::new(2, 2).unwrap();
        #[rustfmt::skip]
        let input = Tensor3D::new(1, 4, 4, vec![
            1.0, 2.0, 5.0, 0.0,
            3.0, 4.0, 1.0, 1.0,
            0.0, 0.0, -1.0, -2.0,
            0.0, 7.0, -3.0, -4.0,
        ]).unwrap();

        let output = pool.forward(&input).unwrap();

        assert_eq!(output.shape(), Shape::spatial(1, 2, 2));
        assert_eq!(output.as_slice(), &[4.0, 5.0, 7.0, -1.0]);
    }

    #[test]
    fn test_maxpool_odd_input_drops_trailing_edge() {
        let pool = MaxPool2DLayer::new(2, 2).unwrap();
        let input = Tensor3D::new(2, 7, 7, vec![1.0; 98]).unwrap();

        let output = pool.forward(&input).unwrap();

        assert_eq!(output.shape(), Shape::spatial(2, 3, 3));
    }

    #[test]
    fn test_maxpool_overlapping_windows() {
        let pool = MaxPool2DLayer::new(2, 1).unwrap();
        let input = Tensor3D::new(1, 1, 3, vec![1.0, 3.0, 2.0]).unwrap();

        // pool height 2 does not fit a single row
        assert!(pool.forward(&input).is_err());

        let input = Tensor3D::new(1, 2, 3, vec![1.0, 3.0, 2.0, 0.0, 0.0, 0.0]).unwrap();
        let output = pool.forward(&input).unwrap();
        assert_eq!(output.as_slice(), &[3.0, 3.0]);
    }

    #[test]
    fn test_maxpool_rejects_zero_config() {
        assert!(MaxPool2DLayer::new(0, 2).is_err());
        assert!(MaxPool2DLayer::new(2, 0).is_err());
    }

    #[test]
    fn test_maxpool_rejects_flat_shape() {
        let pool = MaxPool2DLayer::new(2, 2).unwrap();
        assert!(pool.output_shape(&Shape::Flat(16)).is_err());
    }
}
