use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BalanceError;

/// Trait defining the interface for loss functions
pub trait Loss {
    /// Compute the loss for a batch of predictions and targets
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32;

    /// Compute the gradient of the loss with respect to the predictions
    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean Squared Error loss, averaged over every entry of the batch
pub struct MSE;

impl Loss for MSE {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        (&diff * &diff).mean().unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let n = predictions.len().max(1) as f32;
        (&predictions - &targets) * (2.0 / n)
    }
}

/// Huber loss (smooth L1)
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Loss for HuberLoss {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            let abs_x = x.abs();
            if abs_x <= self.delta {
                0.5 * x * x
            } else {
                self.delta * abs_x - 0.5 * self.delta * self.delta
            }
        })
        .mean()
        .unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let n = predictions.len().max(1) as f32;
        let diff = &predictions - &targets;
        diff.mapv(|x| if x.abs() <= self.delta { x } else { self.delta * x.signum() }) / n
    }
}

/// Serializable choice of regression loss, as named in the run configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
pub enum LossFunction {
    #[default]
    Mse,
    Huber { delta: f32 },
}

impl LossFunction {
    pub fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        match self {
            LossFunction::Mse => MSE.compute_batch(predictions, targets),
            LossFunction::Huber { delta } => HuberLoss::new(*delta).compute_batch(predictions, targets),
        }
    }

    pub fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        match self {
            LossFunction::Mse => MSE.gradient_batch(predictions, targets),
            LossFunction::Huber { delta } => HuberLoss::new(*delta).gradient_batch(predictions, targets),
        }
    }
}

impl FromStr for LossFunction {
    type Err = BalanceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "mse" | "mean_squared_error" => Ok(LossFunction::Mse),
            "huber" => Ok(LossFunction::Huber { delta: 1.0 }),
            other => Err(BalanceError::invalid_parameter(
                "loss_fn_name",
                format!("unknown loss '{}'", other),
            )),
        }
    }
}

impl fmt::Display for LossFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossFunction::Mse => f.write_str("mse"),
            LossFunction::Huber { .. } => f.write_str("huber"),
        }
    }
}
