//! 2D Convolutional layer implementation
//!
//! This module provides a Conv2DLayer that correlates a bank of filters with a
//! zero-padded multi-channel input, adds one bias per filter and applies the
//! layer's activation.

use crate::error::{CnnError, Result};
use crate::layers::Layer;
use crate::tensor::{Shape, Tensor, Tensor3D};
use crate::utils::shape::{element_count, output_size};
use crate::utils::Activation;

/// Convolution filters stored flat as
/// `[filters × in_channels × kernel_height × kernel_width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterBank {
    filters: usize,
    channels: usize,
    kernel_height: usize,
    kernel_width: usize,
    weights: Vec<f32>,
}

impl FilterBank {
    pub fn new(
        filters: usize,
        channels: usize,
        kernel_height: usize,
        kernel_width: usize,
        weights: Vec<f32>,
    ) -> Result<Self> {
        if filters == 0 || channels == 0 || kernel_height == 0 || kernel_width == 0 {
            return Err(CnnError::invalid_config(format!(
                "filter bank dimensions must be positive, got {}x{}x{}x{}",
                filters, channels, kernel_height, kernel_width
            )));
        }
        let expected = element_count(&[filters, channels, kernel_height, kernel_width])?;
        if weights.len() != expected {
            return Err(CnnError::shape_mismatch(
                "filter bank weights",
                expected,
                weights.len(),
            ));
        }
        Ok(Self {
            filters,
            channels,
            kernel_height,
            kernel_width,
            weights,
        })
    }

    /// Builds a bank from nested `[filter][channel][row][column]` data.
    /// Every filter must have the same channel count and kernel size.
    pub fn from_nested(nested: Vec<Vec<Vec<Vec<f32>>>>) -> Result<Self> {
        let filters = nested.len();
        let channels = nested.first().map_or(0, Vec::len);
        let kernel_height = nested
            .first()
            .and_then(|f| f.first())
            .map_or(0, Vec::len);
        let kernel_width = nested
            .first()
            .and_then(|f| f.first())
            .and_then(|c| c.first())
            .map_or(0, Vec::len);

        let capacity = element_count(&[filters, channels, kernel_height, kernel_width]);
        let mut weights = Vec::with_capacity(capacity.unwrap_or(0));
        for (f, filter) in nested.into_iter().enumerate() {
            if filter.len() != channels {
                return Err(CnnError::shape_mismatch(
                    format!("filter {} channel count", f),
                    channels,
                    filter.len(),
                ));
            }
            for kernel in filter {
                if kernel.len() != kernel_height {
                    return Err(CnnError::shape_mismatch(
                        format!("filter {} kernel height", f),
                        kernel_height,
                        kernel.len(),
                    ));
                }
                for row in kernel {
                    if row.len() != kernel_width {
                        return Err(CnnError::shape_mismatch(
                            format!("filter {} kernel width", f),
                            kernel_width,
                            row.len(),
                        ));
                    }
                    weights.extend(row);
                }
            }
        }

        Self::new(filters, channels, kernel_height, kernel_width, weights)
    }

    pub fn filters(&self) -> usize {
        self.filters
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn kernel_height(&self) -> usize {
        self.kernel_height
    }

    pub fn kernel_width(&self) -> usize {
        self.kernel_width
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }
}

/// 2D Convolutional layer with fixed filters.
///
/// # Fields
///
/// * `filters` - Filter bank (filters × in_channels × kernel_h × kernel_w)
/// * `biases` - Bias for each output channel (one per filter)
/// * `stride` - Stride for the convolution operation
/// * `padding` - Zero-padding applied to every side of each input channel
/// * `activation` - Applied after bias addition (ReLU unless overridden)
///
/// # Example
///
/// ```ignore
/// use cnn_inference::layers::{Conv2DLayer, FilterBank};
///
/// let bank = FilterBank::new(1, 1, 3, 3, vec![1.0; 9])?;
/// let layer = Conv2DLayer::new(bank, vec![0.0], 1, 1)?;
/// assert_eq!(layer.out_channels(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Conv2DLayer {
    filters: FilterBank,
    biases: Vec<f32>,
    stride: usize,
    padding: usize,
    activation: Activation,
}

impl Conv2DLayer {
    /// Create a Conv2DLayer with the default ReLU activation.
    ///
    /// # Errors
    ///
    /// `ShapeMismatch` if the bias count differs from the filter count,
    /// `InvalidConfig` if the stride is zero.
    pub fn new(
        filters: FilterBank,
        biases: Vec<f32>,
        stride: usize,
        padding: usize,
    ) -> Result<Self> {
        if biases.len() != filters.filters() {
            return Err(CnnError::shape_mismatch(
                "conv2d bias count",
                filters.filters(),
                biases.len(),
            ));
        }
        if stride == 0 {
            return Err(CnnError::invalid_config("conv2d stride must be greater than 0"));
        }
        Ok(Self {
            filters,
            biases,
            stride,
            padding,
            activation: Activation::default(),
        })
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Get the number of input channels.
    pub fn in_channels(&self) -> usize {
        self.filters.channels()
    }

    /// Get the number of output channels (filters).
    pub fn out_channels(&self) -> usize {
        self.filters.filters()
    }

    /// Get the kernel size as (height, width).
    pub fn kernel_size(&self) -> (usize, usize) {
        (self.filters.kernel_height(), self.filters.kernel_width())
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn padding(&self) -> usize {
        self.padding
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn filters(&self) -> &FilterBank {
        &self.filters
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Output (height, width) for an input of the given spatial size.
    pub fn output_dims(&self, input_height: usize, input_width: usize) -> Result<(usize, usize)> {
        let (kernel_h, kernel_w) = self.kernel_size();
        let out_h = output_size(input_height, kernel_h, self.stride, self.padding)?;
        let out_w = output_size(input_width, kernel_w, self.stride, self.padding)?;
        Ok((out_h, out_w))
    }

    /// Convolve `input` with every filter.
    ///
    /// out[f][y][x] = act(bias[f] + sum over c, ky, kx of
    /// padded[c][y*stride+ky][x*stride+kx] * w[f][c][ky][kx])
    pub fn forward(&self, input: &Tensor3D) -> Result<Tensor3D> {
        if input.channels() != self.in_channels() {
            return Err(CnnError::shape_mismatch(
                "conv2d input channels",
                self.in_channels(),
                input.channels(),
            ));
        }

        let (out_h, out_w) = self.output_dims(input.height(), input.width())?;
        let (kernel_h, kernel_w) = self.kernel_size();
        let in_channels = self.in_channels();

        let output_len = element_count(&[self.out_channels(), out_h, out_w])?;

        let padded = input.zero_padded(self.padding)?;
        let padded_w = padded.width();
        let padded_plane = padded.height() * padded_w;
        let source = padded.as_slice();
        let weights = self.filters.as_slice();

        let mut output = vec![0.0f32; output_len];

        for (oc, out_plane) in output.chunks_exact_mut(out_h * out_w).enumerate() {
            let bias = self.biases[oc];

            for oy in 0..out_h {
                for ox in 0..out_w {
                    let mut sum = 0.0f32;

                    for ic in 0..in_channels {
                        let w_base = (oc * in_channels + ic) * kernel_h * kernel_w;
                        let in_base = ic * padded_plane;

                        for ky in 0..kernel_h {
                            let y = oy * self.stride + ky;
                            let row = in_base + y * padded_w + ox * self.stride;
                            let w_row = w_base + ky * kernel_w;
                            for kx in 0..kernel_w {
                                sum += source[row + kx] * weights[w_row + kx];
                            }
                        }
                    }

                    out_plane[oy * out_w + ox] = self.activation.apply(sum + bias);
                }
            }
        }

        Tensor3D::new(self.out_channels(), out_h, out_w, output)
    }
}

impl Layer for Conv2DLayer {
    fn name(&self) -> &'static str {
        "conv2d"
    }

    fn output_shape(&self, input: &Shape) -> Result<Shape> {
        match *input {
            Shape::Spatial {
                channels,
                height,
                width,
            } => {
                if channels != self.in_channels() {
                    return Err(CnnError::shape_mismatch(
                        "conv2d input channels",
                        self.in_channels(),
                        channels,
                    ));
                }
                let (out_h, out_w) = self.output_dims(height, width)?;
                let shape = Shape::spatial(self.out_channels(), out_h, out_w);
                shape.total()?;
                Ok(shape)
            }
            Shape::Flat(_) => Err(CnnError::shape_mismatch(
                "conv2d input",
                "a CxHxW tensor",
                input,
            )),
        }
    }

    fn forward_tensor(&self, input: Tensor) -> Result<Tensor> {
        let input = input.into_spatial("conv2d input")?;
        let output = self.forward(&input)?;
        tracing::debug!(input = %input.shape(), output = %output.shape(), "conv2d forward");
        Ok(Tensor::Spatial(output))
    }

    fn parameter_count(&self) -> usize {
        self.filters.len() + self.biases.len()
    }
}
