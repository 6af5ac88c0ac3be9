//! Property tests for output-size arithmetic and zero padding.

use cnn_inference::utils::shape::{output_size, pad2d};
use cnn_inference::CnnError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn output_size_matches_closed_form(
        input in 1usize..64,
        kernel in 1usize..8,
        stride in 1usize..5,
        padding in 0usize..4,
    ) {
        let padded = input + 2 * padding;
        match output_size(input, kernel, stride, padding) {
            Ok(size) => {
                prop_assert!(padded >= kernel);
                prop_assert_eq!(size, (padded - kernel) / stride + 1);
                prop_assert!(size >= 1);
            }
            Err(e) => {
                prop_assert!(padded < kernel);
                prop_assert!(matches!(e, CnnError::InvalidConfig(_)));
            }
        }
    }

    #[test]
    fn zero_padding_is_a_no_op(
        height in 1usize..8,
        width in 1usize..8,
        seed in any::<u32>(),
    ) {
        let grid: Vec<f32> = (0..height * width)
            .map(|i| ((i as u32).wrapping_mul(seed) % 97) as f32 - 48.0)
            .collect();
        let padded = pad2d(&grid, height, width, 0).unwrap();
        prop_assert_eq!(padded.as_ref(), grid.as_slice());
    }

    #[test]
    fn padding_preserves_interior_and_zeroes_border(
        height in 1usize..8,
        width in 1usize..8,
        padding in 1usize..4,
    ) {
        let grid: Vec<f32> = (0..height * width).map(|i| i as f32 + 1.0).collect();
        let padded = pad2d(&grid, height, width, padding).unwrap();
        let pw = width + 2 * padding;
        let ph = height + 2 * padding;
        prop_assert_eq!(padded.len(), ph * pw);

        for y in 0..ph {
            for x in 0..pw {
                let value = padded[y * pw + x];
                let inside_rows = y >= padding && y < padding + height;
                let inside_cols = x >= padding && x < padding + width;
                let inside = inside_rows && inside_cols;
                if inside {
                    prop_assert_eq!(value, grid[(y - padding) * width + (x - padding)]);
                } else {
                    prop_assert_eq!(value, 0.0);
                }
            }
        }
    }
}

#[test]
fn test_kernel_equal_to_input_yields_one() {
    for n in 1..10 {
        assert_eq!(output_size(n, n, 1, 0).unwrap(), 1);
    }
}

#[test]
fn test_reference_geometry() {
    assert_eq!(output_size(28, 3, 1, 1).unwrap(), 28);
    assert_eq!(output_size(28, 2, 2, 0).unwrap(), 14);
    assert_eq!(output_size(14, 2, 2, 0).unwrap(), 7);
}

#[test]
fn test_degenerate_geometry_rejected() {
    assert!(output_size(5, 3, 0, 0).is_err());
    assert!(output_size(5, 0, 1, 0).is_err());
    assert!(output_size(0, 1, 1, 0).is_err());
    assert!(output_size(2, 5, 1, 1).is_err());
}

#[test]
fn test_overflowing_padding_rejected() {
    let err = output_size(28, 3, 1, usize::MAX / 2 + 1).unwrap_err();
    assert!(matches!(err, CnnError::InvalidConfig(_)));
    assert!(matches!(
        pad2d(&[1.0], 1, 1, usize::MAX / 2 + 1),
        Err(CnnError::InvalidConfig(_))
    ));
}
