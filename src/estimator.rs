//! # Estimator capability
//!
//! The training loops never touch layers or optimizers directly. They see an
//! estimator: something that maps a batch of states to a batch of outputs and
//! can be moved towards targets or along an output gradient. Any numerical
//! backend can sit behind this trait; the crate ships
//! [`NeuralNetwork`](crate::network::NeuralNetwork).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{BalanceError, Result};

/// Weights and biases of one dense layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Ordered snapshot of every trainable parameter of an estimator
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Default)]
pub struct Parameters {
    pub layers: Vec<LayerParameters>,
}

impl Parameters {
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total number of scalar parameters
    pub fn count(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }
}

/// A trainable function approximator.
pub trait Estimator {
    fn input_dim(&self) -> usize;

    fn output_dim(&self) -> usize;

    /// Evaluate a `(batch, input_dim)` matrix. Never changes parameters.
    fn infer(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Evaluate a single input vector.
    fn infer_one(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let outputs = self.infer(input.insert_axis(Axis(0)))?;
        if outputs.nrows() != 1 {
            return Err(BalanceError::dimension_mismatch(
                "1 output row".to_string(),
                format!("{} output rows", outputs.nrows()),
            ));
        }
        Ok(outputs.index_axis_move(Axis(0), 0))
    }

    /// Take one optimizer step towards `targets` under the estimator's
    /// regression loss. Returns the loss measured before the step.
    fn fit(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    /// Take one optimizer step along `output_gradients`, the derivative of an
    /// externally defined loss with respect to the estimator's outputs.
    fn apply_gradients(&mut self, inputs: ArrayView2<f32>, output_gradients: ArrayView2<f32>) -> Result<()>;

    fn parameters(&self) -> Parameters;

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()>;

    fn learning_rate(&self) -> f32;

    fn set_learning_rate(&mut self, learning_rate: f32);

    /// Drop accumulated optimizer state (moment estimates, step counters).
    fn reset_optimizer(&mut self);
}
