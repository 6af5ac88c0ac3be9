//! Activation functions
//!
//! Every layer applies an [`Activation`] right after bias addition. The
//! rectifier is the default; `Identity` lets a caller plug in a pass-through
//! policy for a particular layer. `softmax` is only used to present the final
//! scores as probabilities.

use serde::Deserialize;

/// Elementwise nonlinearity applied at the end of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Activation {
    /// max(0, x)
    #[default]
    Relu,
    /// x
    Identity,
}

impl TryFrom<String> for Activation {
    type Error = String;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Activation::from_name(&name).ok_or_else(|| {
            format!(
                "Unknown activation '{}'. Must be one of: relu, identity, linear",
                name
            )
        })
    }
}

impl Activation {
    /// Parses a config name ("relu" or "identity"), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "relu" => Some(Activation::Relu),
            "identity" | "linear" => Some(Activation::Identity),
            _ => None,
        }
    }

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => relu(x),
            Activation::Identity => x,
        }
    }
}

/// ReLU activation function.
#[inline]
pub fn relu(x: f32) -> f32 {
    if x > 0.0 {
        x
    } else {
        0.0
    }
}

/// Softmax over a single score vector.
///
/// Uses the max-subtraction trick for numerical stability. An empty input
/// yields an empty output.
pub fn softmax(scores: &[f32]) -> Vec<f32> {
    let Some(&first) = scores.first() else {
        return Vec::new();
    };
    let max_value = scores.iter().skip(1).fold(first, |m, &v| if v > m { v } else { m });

    let mut out: Vec<f32> = scores.iter().map(|&v| (v - max_value).exp()).collect();
    let sum: f32 = out.iter().sum();
    let inv_sum = 1.0f32 / sum;
    for value in out.iter_mut() {
        *value *= inv_sum;
    }
    out
}
