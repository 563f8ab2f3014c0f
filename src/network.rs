use ndarray::{Array1, Array2, ArrayView2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::estimator::{Estimator, LayerParameters, Parameters};
use crate::error::{BalanceError, Result};
use crate::layers::DenseLayer;
use crate::loss::LossFunction;
use crate::optimizer::{Optimizer, OptimizerWrapper};

fn entropy_rng() -> StdRng {
    StdRng::from_entropy()
}

/// A multilayer perceptron made of dense layers, trained by backpropagation.
///
/// The network owns its optimizer, its regression loss and its current
/// learning rate, and implements [`Estimator`]. Dropout masks are drawn from a
/// generator seeded at construction, so two networks built from the same seed
/// train identically.
#[derive(Serialize, Deserialize, Clone)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
    pub loss: LossFunction,
    pub learning_rate: f32,
    #[serde(skip, default = "entropy_rng")]
    rng: StdRng,
}

impl NeuralNetwork {
    /// Assemble a network from already-built layers.
    pub fn new(
        layers: Vec<DenseLayer>,
        optimizer: OptimizerWrapper,
        loss: LossFunction,
        learning_rate: f32,
        seed: u64,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(BalanceError::invalid_parameter("layers", "network needs at least one layer"));
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(BalanceError::dimension_mismatch(
                    format!("layer {} input of {}", i + 1, pair[0].output_size()),
                    format!("{}", pair[1].input_size()),
                ));
            }
        }
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(BalanceError::invalid_parameter(
                "learning_rate",
                format!("{} must be positive", learning_rate),
            ));
        }

        Ok(NeuralNetwork {
            layers,
            optimizer,
            loss,
            learning_rate,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Reseed the dropout generator, e.g. after loading from disk.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    fn check_inputs(&self, inputs: &ArrayView2<f32>) -> Result<()> {
        let expected = self.input_dim();
        if inputs.ncols() != expected {
            return Err(BalanceError::dimension_mismatch(
                format!("{} input features", expected),
                format!("{} input features", inputs.ncols()),
            ));
        }
        Ok(())
    }

    /// Inference pass for a batch of inputs.
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &self.layers {
            current = layer.forward_batch(current.view());
        }
        current
    }

    /// Training pass: every layer caches what backpropagation needs.
    fn forward_train(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.forward_train(current.view(), &mut self.rng);
        }
        current
    }

    /// Backpropagate an output error through all layers, returning the
    /// weight and bias gradients ordered from the first layer to the last.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for layer in self.layers.iter().rev() {
            let grads = layer.backward_batch(current_error.view())?;
            gradients.push((grads.weight_gradients, grads.bias_gradients));
            current_error = grads.input_error;
        }

        gradients.reverse();
        Ok(gradients)
    }

    fn apply_layer_gradients(&mut self, gradients: Vec<(Array2<f32>, Array1<f32>)>) {
        let learning_rate = self.learning_rate;
        self.optimizer.begin_step();
        for (i, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(i, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(i, &mut layer.biases, &bias_gradients, learning_rate);
        }
    }

    /// Save the network, including optimizer state, with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a network saved by [`NeuralNetwork::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        let network: Self = bincode::deserialize(&data)?;
        Ok(network)
    }
}

impl Estimator for NeuralNetwork {
    fn input_dim(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_size)
    }

    fn output_dim(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_size)
    }

    fn infer(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_inputs(&inputs)?;
        Ok(self.forward_batch(inputs))
    }

    fn fit(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.check_inputs(&inputs)?;
        if targets.dim() != (inputs.nrows(), self.output_dim()) {
            return Err(BalanceError::dimension_mismatch(
                format!("{:?}", (inputs.nrows(), self.output_dim())),
                format!("{:?}", targets.dim()),
            ));
        }

        let outputs = self.forward_train(inputs);
        let loss = self.loss.compute_batch(outputs.view(), targets);
        let output_errors = self.loss.gradient_batch(outputs.view(), targets);
        let gradients = self.backward_batch(output_errors.view())?;
        self.apply_layer_gradients(gradients);
        Ok(loss)
    }

    fn apply_gradients(&mut self, inputs: ArrayView2<f32>, output_gradients: ArrayView2<f32>) -> Result<()> {
        self.check_inputs(&inputs)?;
        if output_gradients.dim() != (inputs.nrows(), self.output_dim()) {
            return Err(BalanceError::dimension_mismatch(
                format!("{:?}", (inputs.nrows(), self.output_dim())),
                format!("{:?}", output_gradients.dim()),
            ));
        }

        self.forward_train(inputs);
        let gradients = self.backward_batch(output_gradients)?;
        self.apply_layer_gradients(gradients);
        Ok(())
    }

    fn parameters(&self) -> Parameters {
        Parameters {
            layers: self
                .layers
                .iter()
                .map(|layer| LayerParameters {
                    weights: layer.weights.clone(),
                    biases: layer.biases.clone(),
                })
                .collect(),
        }
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        if parameters.len() != self.layers.len() {
            return Err(BalanceError::dimension_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", parameters.len()),
            ));
        }
        for (i, (layer, params)) in self.layers.iter().zip(&parameters.layers).enumerate() {
            if layer.weights.dim() != params.weights.dim() || layer.biases.dim() != params.biases.dim() {
                return Err(BalanceError::dimension_mismatch(
                    format!("layer {} shaped {:?}", i, layer.weights.dim()),
                    format!("{:?}", params.weights.dim()),
                ));
            }
        }
        for (layer, params) in self.layers.iter_mut().zip(&parameters.layers) {
            layer.weights.assign(&params.weights);
            layer.biases.assign(&params.biases);
        }
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn reset_optimizer(&mut self) {
        self.optimizer.reset();
    }
}
