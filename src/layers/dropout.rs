use ndarray::Array2;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, Result};

/// Inverted dropout applied to a layer's activated output during training.
///
/// Units are zeroed with probability `rate` and survivors are scaled by
/// `1 / (1 - rate)`, so inference needs no rescaling.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Dropout {
    pub rate: f32,
}

impl Dropout {
    pub fn new(rate: f32) -> Result<Self> {
        if !(0.0..1.0).contains(&rate) {
            return Err(BalanceError::invalid_parameter(
                "dropout",
                format!("rate {} must be in [0, 1)", rate),
            ));
        }
        Ok(Dropout { rate })
    }

    /// Draw a mask with the same shape as the layer output.
    pub fn sample_mask(&self, dim: (usize, usize), rng: &mut StdRng) -> Array2<f32> {
        if self.rate == 0.0 {
            return Array2::ones(dim);
        }
        let scale = 1.0 / (1.0 - self.rate);
        Array2::from_shape_fn(dim, |_| {
            if rng.gen::<f32>() >= self.rate {
                scale
            } else {
                0.0
            }
        })
    }
}
