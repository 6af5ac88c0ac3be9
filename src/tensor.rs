//! Tensor types passed between pipeline stages.
//!
//! A [`Tensor3D`] is a (channel, row, column) grid kept in a single flat
//! buffer: channel-major, then row-major, so `index = (c * height + y) * width + x`.
//! That layout is also the contractual flatten order, which makes flattening
//! a move of the backing buffer rather than a copy.

use crate::error::{CnnError, Result};
use crate::utils::shape::{element_count, pad2d, padded_len};
use std::borrow::Cow;
use std::fmt;

/// Shape of the value flowing out of a pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Spatial {
        channels: usize,
        height: usize,
        width: usize,
    },
    Flat(usize),
}

impl Shape {
    pub const fn spatial(channels: usize, height: usize, width: usize) -> Self {
        Shape::Spatial {
            channels,
            height,
            width,
        }
    }

    /// Total number of elements. Fails with `InvalidConfig` if a spatial
    /// shape holds more elements than `usize` can count.
    pub fn total(&self) -> Result<usize> {
        match *self {
            Shape::Spatial {
                channels,
                height,
                width,
            } => element_count(&[channels, height, width]),
            Shape::Flat(len) => Ok(len),
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Shape::Flat(_))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Spatial {
                channels,
                height,
                width,
            } => write!(f, "{}x{}x{}", channels, height, width),
            Shape::Flat(len) => write!(f, "[{}]", len),
        }
    }
}

/// Multi-channel 2-D tensor with a flat backing store.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor3D {
    channels: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
}

impl Tensor3D {
    /// Wraps a flat buffer laid out channel, row, column.
    pub fn new(channels: usize, height: usize, width: usize, data: Vec<f32>) -> Result<Self> {
        if channels == 0 || height == 0 || width == 0 {
            return Err(CnnError::invalid_config(format!(
                "tensor dimensions must be positive, got {}x{}x{}",
                channels, height, width
            )));
        }
        let expected = element_count(&[channels, height, width])?;
        if data.len() != expected {
            return Err(CnnError::shape_mismatch(
                format!("tensor {}x{}x{} buffer", channels, height, width),
                expected,
                data.len(),
            ));
        }
        Ok(Self {
            channels,
            height,
            width,
            data,
        })
    }

    pub fn zeros(channels: usize, height: usize, width: usize) -> Result<Self> {
        Self::filled(channels, height, width, 0.0)
    }

    pub fn filled(channels: usize, height: usize, width: usize, value: f32) -> Result<Self> {
        let len = element_count(&[channels, height, width])?;
        Self::new(channels, height, width, vec![value; len])
    }

    /// Builds a tensor from nested `[channel][row][column]` data, rejecting
    /// ragged rows or channels of differing size.
    pub fn from_nested(nested: Vec<Vec<Vec<f32>>>) -> Result<Self> {
        let channels = nested.len();
        let height = nested.first().map_or(0, Vec::len);
        let width = nested
            .first()
            .and_then(|channel| channel.first())
            .map_or(0, Vec::len);

        let mut data = Vec::with_capacity(element_count(&[channels, height, width]).unwrap_or(0));
        for (c, channel) in nested.into_iter().enumerate() {
            if channel.len() != height {
                return Err(CnnError::shape_mismatch(
                    format!("channel {} height", c),
                    height,
                    channel.len(),
                ));
            }
            for (y, row) in channel.into_iter().enumerate() {
                if row.len() != width {
                    return Err(CnnError::shape_mismatch(
                        format!("channel {} row {} width", c, y),
                        width,
                        row.len(),
                    ));
                }
                data.extend(row);
            }
        }

        Self::new(channels, height, width, data)
    }

    /// Single-channel tensor from a `[row][column]` grid.
    pub fn from_grid(grid: Vec<Vec<f32>>) -> Result<Self> {
        Self::from_nested(vec![grid])
    }

    /// Inverse of [`Tensor3D::flatten`]: reinterprets a vector laid out
    /// channel, row, column as a `channels × height × width` tensor.
    pub fn from_vector(
        vector: Vector1D,
        channels: usize,
        height: usize,
        width: usize,
    ) -> Result<Self> {
        Self::new(channels, height, width, vector.into_vec())
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn shape(&self) -> Shape {
        Shape::spatial(self.channels, self.height, self.width)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline(always)]
    fn offset(&self, channel: usize, y: usize, x: usize) -> usize {
        (channel * self.height + y) * self.width + x
    }

    /// Value at (channel, row, column), or `None` when out of bounds.
    pub fn get(&self, channel: usize, y: usize, x: usize) -> Option<f32> {
        if channel < self.channels && y < self.height && x < self.width {
            Some(self.data[self.offset(channel, y, x)])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Copies the tensor back into nested `[channel][row][column]` form.
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        self.data
            .chunks_exact(self.height * self.width)
            .map(|plane| plane.chunks_exact(self.width).map(<[f32]>::to_vec).collect())
            .collect()
    }

    /// Zero-pads every channel independently. Borrows `self` when `padding == 0`.
    pub fn zero_padded(&self, padding: usize) -> Result<Cow<'_, Tensor3D>> {
        if padding == 0 {
            return Ok(Cow::Borrowed(self));
        }

        let height = padded_len(self.height, padding)?;
        let width = padded_len(self.width, padding)?;
        let mut data = Vec::with_capacity(element_count(&[self.channels, height, width])?);
        for plane in self.data.chunks_exact(self.height * self.width) {
            data.extend_from_slice(&pad2d(plane, self.height, self.width, padding)?);
        }

        Ok(Cow::Owned(Tensor3D {
            channels: self.channels,
            height,
            width,
            data,
        }))
    }

    /// Channel-major, row-major flattening. The backing buffer already has
    /// this order, so no element moves.
    pub fn flatten(self) -> Vector1D {
        Vector1D(self.data)
    }
}

/// Fixed-length vector used as dense-layer input and output.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector1D(Vec<f32>);

impl Vector1D {
    pub fn from_vec(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn shape(&self) -> Shape {
        Shape::Flat(self.0.len())
    }
}

impl From<Vec<f32>> for Vector1D {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Value handed from one stage to the next.
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    Spatial(Tensor3D),
    Flat(Vector1D),
}

impl Tensor {
    pub fn shape(&self) -> Shape {
        match self {
            Tensor::Spatial(t) => t.shape(),
            Tensor::Flat(v) => v.shape(),
        }
    }

    /// Unwraps a spatial tensor; `context` names the consumer for the error.
    pub fn into_spatial(self, context: &str) -> Result<Tensor3D> {
        match self {
            Tensor::Spatial(t) => Ok(t),
            Tensor::Flat(v) => Err(CnnError::shape_mismatch(
                context,
                "a CxHxW tensor",
                v.shape(),
            )),
        }
    }

    /// Unwraps a flat vector; `context` names the consumer for the error.
    pub fn into_flat(self, context: &str) -> Result<Vector1D> {
        match self {
            Tensor::Flat(v) => Ok(v),
            Tensor::Spatial(t) => Err(CnnError::shape_mismatch(
                context,
                "a flat vector",
                t.shape(),
            )),
        }
    }
}

impl From<Tensor3D> for Tensor {
    fn from(t: Tensor3D) -> Self {
        Tensor::Spatial(t)
    }
}

impl From<Vector1D> for Tensor {
    fn from(v: Vector1D) -> Self {
        Tensor::Flat(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tensor3D {
        Tensor3D::new(2, 2, 3, (0..12).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn test_indexing_is_channel_row_column() {
        let t = sample();
        assert_eq!(t.get(0, 0, 0), Some(0.0));
        assert_eq!(t.get(0, 1, 2), Some(5.0));
        assert_eq!(t.get(1, 0, 0), Some(6.0));
        assert_eq!(t.get(1, 1, 2), Some(11.0));
        assert_eq!(t.get(2, 0, 0), None);
        assert_eq!(t.get(0, 2, 0), None);
    }

    #[test]
    fn test_new_rejects_wrong_buffer_length() {
        let err = Tensor3D::new(1, 2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, CnnError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_new_rejects_zero_dimension() {
        assert!(matches!(
            Tensor3D::new(0, 2, 2, vec![]).unwrap_err(),
            CnnError::InvalidConfig(_)
        ));
    }

    #[test]
    fn test_from_nested_rejects_ragged_rows() {
        let nested = vec![vec![vec![1.0, 2.0], vec![3.0]]];
        assert!(Tensor3D::from_nested(nested).is_err());
    }

    #[test]
    fn test_from_nested_rejects_uneven_channels() {
        let nested = vec![vec![vec![1.0, 2.0]], vec![vec![1.0, 2.0], vec![3.0, 4.0]]];
        assert!(Tensor3D::from_nested(nested).is_err());
    }

    #[test]
    fn test_nested_round_trip() {
        let t = sample();
        let back = Tensor3D::from_nested(t.to_nested()).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_zero_padded_keeps_interior() {
        let t = sample();
        let padded = t.zero_padded(1).unwrap();
        assert_eq!(padded.shape(), Shape::spatial(2, 4, 5));
        assert_eq!(padded.get(1, 0, 0), Some(0.0));
        assert_eq!(padded.get(1, 2, 3), t.get(1, 1, 2));
    }

    #[test]
    fn test_overflowing_dimensions_are_config_errors() {
        let huge = usize::MAX / 2;
        assert!(matches!(
            Shape::spatial(3, huge, 2).total(),
            Err(CnnError::InvalidConfig(_))
        ));
        assert!(matches!(
            Tensor3D::new(1, huge, 4, Vec::new()),
            Err(CnnError::InvalidConfig(_))
        ));
        assert!(matches!(
            Tensor3D::zeros(huge, huge, 1),
            Err(CnnError::InvalidConfig(_))
        ));
        assert!(matches!(
            sample().zero_padded(huge),
            Err(CnnError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_into_flat_on_spatial_is_error() {
        let err = Tensor::from(sample()).into_flat("dense1").unwrap_err();
        assert!(err.to_string().contains("dense1"));
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::spatial(3, 28, 28).to_string(), "3x28x28");
        assert_eq!(Shape::Flat(245).to_string(), "[245]");
    }
}
