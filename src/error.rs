//! Error types for the inference pipeline.
//!
//! Every fallible operation in the library returns [`Result<T>`]. Shape
//! problems and bad configuration are detected before any indexing happens,
//! so a forward pass either completes or fails with one of these variants and
//! no partial output.

use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CnnError {
    /// A tensor, vector or parameter array disagrees with the shape a layer
    /// was configured for.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Non-positive stride, pool or kernel size, or a geometry that would
    /// produce an empty output.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The file is not a PNG or JPEG, or it decoded to a layout that cannot
    /// be mapped to a luma grid.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] png::DecodingError),

    #[error(transparent)]
    Jpeg(#[from] jpeg_decoder::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl CnnError {
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl Display,
        actual: impl Display,
    ) -> Self {
        Self::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CnnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message_names_both_shapes() {
        let err = CnnError::shape_mismatch("conv1 input channels", 1, 2);
        assert_eq!(
            err.to_string(),
            "shape mismatch in conv1 input channels: expected 1, got 2"
        );
    }

    #[test]
    fn test_io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.png");
        let err: CnnError = io.into();
        assert_eq!(err.to_string(), "missing.png");
        assert!(matches!(err, CnnError::Io(_)));
    }
}
