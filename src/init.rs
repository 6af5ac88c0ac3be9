//! Parameter providers.
//!
//! Layers never draw their own weights. A [`ParamProvider`] is handed to the
//! network builder and asked for arrays of an exact size, so the numeric
//! behavior of a pipeline depends only on the provider it was built with.

use crate::error::{CnnError, Result};
use crate::layers::FilterBank;
use crate::utils::shape::element_count;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Source of weight and bias values.
pub trait ParamProvider {
    /// Produce `count` values.
    fn fill(&mut self, count: usize) -> Vec<f32>;

    fn filter_bank(
        &mut self,
        filters: usize,
        channels: usize,
        kernel_height: usize,
        kernel_width: usize,
    ) -> Result<FilterBank> {
        let count = element_count(&[filters, channels, kernel_height, kernel_width])?;
        let weights = self.fill(count);
        FilterBank::new(filters, channels, kernel_height, kernel_width, weights)
    }

    fn bias(&mut self, len: usize) -> Vec<f32> {
        self.fill(len)
    }

    /// Row-major `rows × cols` matrix.
    fn weight_matrix(&mut self, rows: usize, cols: usize) -> Result<Vec<f32>> {
        let count = element_count(&[rows, cols])?;
        Ok(self.fill(count))
    }
}

/// Draws every value from N(0, std_dev) using a seeded ChaCha8 generator.
///
/// # Example
///
/// ```ignore
/// let mut init = GaussianInit::new(42, 0.1)?;
/// let bias = init.bias(3);
/// ```
pub struct GaussianInit {
    rng: ChaCha8Rng,
    normal: Normal<f32>,
    seed: u64,
}

impl GaussianInit {
    /// Default scale for freshly drawn weights.
    pub const DEFAULT_STD: f32 = 0.1;

    pub fn new(seed: u64, std_dev: f32) -> Result<Self> {
        if !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(CnnError::invalid_config(format!(
                "init_std must be a positive finite number, got {}",
                std_dev
            )));
        }
        let normal = Normal::new(0.0, std_dev)
            .map_err(|e| CnnError::invalid_config(format!("init_std: {}", e)))?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            normal,
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl ParamProvider for GaussianInit {
    fn fill(&mut self, count: usize) -> Vec<f32> {
        (0..count).map(|_| self.normal.sample(&mut self.rng)).collect()
    }
}

/// Fills every array with one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantInit(pub f32);

impl ParamProvider for ConstantInit {
    fn fill(&mut self, count: usize) -> Vec<f32> {
        vec![self.0; count]
    }
}
