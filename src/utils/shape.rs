//! Output-dimension arithmetic and zero padding shared by the windowed layers.

use crate::error::{CnnError, Result};
use std::borrow::Cow;

/// Spatial output size of a sliding window along one axis.
///
/// Calculated as: (input + 2*padding - kernel) / stride + 1
///
/// Fails with [`CnnError::InvalidConfig`] when the stride or window is zero, the
/// input is empty, or the padded input is smaller than the window (which would
/// yield an output size of zero or less).
pub fn output_size(input: usize, kernel: usize, stride: usize, padding: usize) -> Result<usize> {
    if stride == 0 {
        return Err(CnnError::invalid_config("stride must be greater than 0"));
    }
    if kernel == 0 {
        return Err(CnnError::invalid_config(
            "kernel/pool size must be greater than 0",
        ));
    }
    if input == 0 {
        return Err(CnnError::invalid_config("input size must be greater than 0"));
    }

    let padded = padded_len(input, padding)?;
    if padded < kernel {
        return Err(CnnError::invalid_config(format!(
            "window of size {} does not fit input of size {} with padding {}",
            kernel, input, padding
        )));
    }

    Ok((padded - kernel) / stride + 1)
}

/// `len + 2 * padding`, or `InvalidConfig` if that does not fit in `usize`.
pub fn padded_len(len: usize, padding: usize) -> Result<usize> {
    padding
        .checked_mul(2)
        .and_then(|both| len.checked_add(both))
        .ok_or_else(|| {
            CnnError::invalid_config(format!(
                "padding {} on a side of length {} overflows",
                padding, len
            ))
        })
}

/// Number of elements in a tensor with the given dimensions.
///
/// Fails with `InvalidConfig` when the product does not fit in `usize`.
pub fn element_count(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            CnnError::invalid_config(format!(
                "dimensions {:?} overflow the addressable element count",
                dims
            ))
        })
}

/// Zero-pads a row-major `height × width` grid by `padding` cells on every side.
///
/// Returns the input itself when `padding` is zero.
pub fn pad2d(
    grid: &[f32],
    height: usize,
    width: usize,
    padding: usize,
) -> Result<Cow<'_, [f32]>> {
    if padding == 0 {
        return Ok(Cow::Borrowed(grid));
    }

    let padded_w = padded_len(width, padding)?;
    let padded_h = padded_len(height, padding)?;
    let mut padded = vec![0.0f32; element_count(&[padded_h, padded_w])?];

    for (y, row) in grid.chunks_exact(width).take(height).enumerate() {
        let start = (y + padding) * padded_w + padding;
        padded[start..start + width].copy_from_slice(row);
    }

    Ok(Cow::Owned(padded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_size_same_padding() {
        // 3x3 kernel with padding 1 keeps spatial size
        assert_eq!(output_size(28, 3, 1, 1).unwrap(), 28);
    }

    #[test]
    fn test_output_size_pooling() {
        assert_eq!(output_size(28, 2, 2, 0).unwrap(), 14);
        assert_eq!(output_size(7, 2, 2, 0).unwrap(), 3);
    }

    #[test]
    fn test_output_size_kernel_equals_input() {
        assert_eq!(output_size(5, 5, 1, 0).unwrap(), 1);
    }

    #[test]
    fn test_output_size_rejects_zero_stride() {
        assert!(output_size(28, 3, 0, 1).is_err());
    }

    #[test]
    fn test_output_size_rejects_oversized_window() {
        assert!(output_size(1, 2, 2, 0).is_err());
        // Padding can make a large kernel fit again
        assert_eq!(output_size(1, 3, 1, 1).unwrap(), 1);
    }

    #[test]
    fn test_output_size_overflowing_padding() {
        let err = output_size(28, 3, 1, usize::MAX / 2 + 1).unwrap_err();
        assert!(matches!(err, CnnError::InvalidConfig(_)));
        assert!(output_size(usize::MAX, 3, 1, 1).is_err());
    }

    #[test]
    fn test_element_count() {
        assert_eq!(element_count(&[5, 7, 7]).unwrap(), 245);
        assert_eq!(element_count(&[]).unwrap(), 1);
        assert!(element_count(&[1, usize::MAX / 2, 3]).is_err());
    }

    #[test]
    fn test_pad2d_zero_is_borrowed() {
        let grid = vec![1.0, 2.0, 3.0, 4.0];
        let padded = pad2d(&grid, 2, 2, 0).unwrap();
        assert!(matches!(padded, Cow::Borrowed(_)));
        assert_eq!(&*padded, grid.as_slice());
    }

    #[test]
    fn test_pad2d_border() {
        let grid = vec![1.0, 2.0, 3.0, 4.0];
        let padded = pad2d(&grid, 2, 2, 1).unwrap();
        #[rustfmt::skip]
        let expected = vec![
            0.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 2.0, 0.0,
            0.0, 3.0, 4.0, 0.0,
            0.0, 0.0, 0.0, 0.0,
        ];
        assert_eq!(padded.into_owned(), expected);
    }
}
