use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::dropout::Dropout;
use super::initialization::WeightInit;
use crate::activations::Activation;
use crate::error::{BalanceError, Result};

/// Values stored by a training forward pass and consumed by the backward pass.
#[derive(Clone, Debug)]
struct ForwardCache {
    inputs: Array2<f32>,
    pre_activation: Array2<f32>,
    mask: Option<Array2<f32>>,
}

/// Gradients produced by one backward pass through a layer.
#[derive(Clone, Debug)]
pub struct LayerGradients {
    /// Error with respect to the layer's inputs, to be fed to the previous layer
    pub input_error: Array2<f32>,
    pub weight_gradients: Array2<f32>,
    pub bias_gradients: Array1<f32>,
}

/// A fully connected (dense) layer in a neural network
#[derive(Serialize, Deserialize, Clone)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    pub dropout: Option<Dropout>,
    #[serde(skip)]
    cache: Option<ForwardCache>,
}

impl DenseLayer {
    /// Create a new dense layer with weights drawn from `init`. Biases start at zero.
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut StdRng,
    ) -> Result<Self> {
        let weights = init.initialize_weights((input_size, output_size), rng)?;
        let biases = init.initialize_biases(output_size);
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            dropout: None,
            cache: None,
        })
    }

    /// Build a layer around existing parameters.
    pub fn from_parameters(weights: Array2<f32>, biases: Array1<f32>, activation: Activation) -> Result<Self> {
        if weights.shape()[1] != biases.len() {
            return Err(BalanceError::dimension_mismatch(
                format!("{} biases", weights.shape()[1]),
                format!("{} biases", biases.len()),
            ));
        }
        Ok(DenseLayer {
            weights,
            biases,
            activation,
            dropout: None,
            cache: None,
        })
    }

    pub fn with_dropout(mut self, dropout: Dropout) -> Self {
        self.dropout = Some(dropout);
        self
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }

    /// Inference pass. Dropout is disabled and nothing is cached.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Training pass. Caches inputs and pre-activations and applies dropout.
    pub fn forward_train(&mut self, inputs: ArrayView2<f32>, rng: &mut StdRng) -> Array2<f32> {
        let pre_activation = self.affine(inputs);
        let mut outputs = pre_activation.clone();
        self.activation.apply_batch(&mut outputs);

        let mask = self.dropout.map(|dropout| dropout.sample_mask(outputs.dim(), rng));
        if let Some(ref mask) = mask {
            outputs *= mask;
        }

        self.cache = Some(ForwardCache {
            inputs: inputs.to_owned(),
            pre_activation,
            mask,
        });
        outputs
    }

    /// Backpropagate the error with respect to this layer's output.
    pub fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<LayerGradients> {
        let cache = self.cache.as_ref().ok_or_else(|| {
            BalanceError::TrainingError("forward_train() must be called before backward_batch()".to_string())
        })?;
        if output_errors.dim() != cache.pre_activation.dim() {
            return Err(BalanceError::dimension_mismatch(
                format!("{:?}", cache.pre_activation.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let mut errors = output_errors.to_owned();
        if let Some(ref mask) = cache.mask {
            errors *= mask;
        }

        let activation_deriv = self.activation.derivative_batch(cache.pre_activation.view());
        let adjusted_error = errors * &activation_deriv;
        let weight_gradients = cache.inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));
        let input_error = adjusted_error.dot(&self.weights.t());

        Ok(LayerGradients {
            input_error,
            weight_gradients,
            bias_gradients,
        })
    }
}
