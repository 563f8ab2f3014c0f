use ndarray::{Array1, Array2};
use rand_distr::{Normal, Uniform};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BalanceError, Result};

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    /// Xavier/Glorot uniform initialization
    XavierUniform,

    /// Xavier/Glorot normal initialization
    XavierNormal,

    /// He/Kaiming uniform initialization (for ReLU)
    HeUniform,

    /// He/Kaiming normal initialization (for ReLU)
    HeNormal,

    /// Uniform distribution with custom range
    Uniform { min: f32, max: f32 },

    /// All zeros
    Zeros,
}

impl WeightInit {
    /// Initialize a `(fan_in, fan_out)` weight matrix from the run's generator.
    pub fn initialize_weights(&self, shape: (usize, usize), rng: &mut StdRng) -> Result<Array2<f32>> {
        let (fan_in, fan_out) = shape;
        if fan_in == 0 || fan_out == 0 {
            return Err(BalanceError::invalid_parameter(
                "layer_sizes",
                format!("layer shape {:?} has a zero dimension", shape),
            ));
        }

        let weights = match self {
            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }
            WeightInit::XavierNormal => {
                let std = (2.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::random_using(shape, normal(std)?, rng)
            }
            WeightInit::HeUniform => {
                let limit = (6.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, Uniform::new(-limit, limit), rng)
            }
            WeightInit::HeNormal => {
                let std = (2.0 / fan_in as f32).sqrt();
                Array2::random_using(shape, normal(std)?, rng)
            }
            WeightInit::Uniform { min, max } => {
                if min >= max {
                    return Err(BalanceError::invalid_parameter(
                        "kernel_initializer",
                        format!("uniform range [{}, {}) is empty", min, max),
                    ));
                }
                Array2::random_using(shape, Uniform::new(*min, *max), rng)
            }
            WeightInit::Zeros => Array2::zeros(shape),
        };
        Ok(weights)
    }

    /// Biases always start at zero, matching the usual dense-layer default.
    pub fn initialize_biases(&self, size: usize) -> Array1<f32> {
        Array1::zeros(size)
    }
}

fn normal(std: f32) -> Result<Normal<f32>> {
    Normal::new(0.0, std)
        .map_err(|e| BalanceError::invalid_parameter("kernel_initializer", e.to_string()))
}

impl FromStr for WeightInit {
    type Err = BalanceError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "glorot_uniform" | "xavier_uniform" => Ok(WeightInit::XavierUniform),
            "glorot_normal" | "xavier_normal" => Ok(WeightInit::XavierNormal),
            "he_uniform" => Ok(WeightInit::HeUniform),
            "he_normal" => Ok(WeightInit::HeNormal),
            "uniform" => Ok(WeightInit::Uniform { min: -0.1, max: 0.1 }),
            "zeros" => Ok(WeightInit::Zeros),
            other => Err(BalanceError::invalid_parameter(
                "kernel_initializer",
                format!("unknown initializer '{}'", other),
            )),
        }
    }
}

impl fmt::Display for WeightInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeightInit::XavierUniform => "glorot_uniform",
            WeightInit::XavierNormal => "glorot_normal",
            WeightInit::HeUniform => "he_uniform",
            WeightInit::HeNormal => "he_normal",
            WeightInit::Uniform { .. } => "uniform",
            WeightInit::Zeros => "zeros",
        };
        f.write_str(name)
    }
}
