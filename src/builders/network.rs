use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::{BalanceError, Result};
use crate::layers::{DenseLayer, Dropout, WeightInit};
use crate::loss::LossFunction;
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerKind, OptimizerWrapper};

/// Builder for multilayer perceptrons with a fluent API.
///
/// The layout is `input -> hidden[0] -> ... -> hidden[n-1] -> output`. When a
/// dropout rate is set it follows every hidden layer except the first.
#[derive(Clone, Debug)]
pub struct NetworkBuilder {
    input_dim: usize,
    output_dim: usize,
    hidden: Vec<usize>,
    hidden_activation: Activation,
    output_activation: Activation,
    initializer: WeightInit,
    optimizer: OptimizerKind,
    loss: LossFunction,
    learning_rate: f32,
    dropout: Option<f32>,
    seed: u64,
}

impl NetworkBuilder {
    /// Start a network with the given input and output widths
    pub fn new(input_dim: usize, output_dim: usize) -> Self {
        NetworkBuilder {
            input_dim,
            output_dim,
            hidden: Vec::new(),
            hidden_activation: Activation::Relu,
            output_activation: Activation::Linear,
            initializer: WeightInit::HeNormal,
            optimizer: OptimizerKind::Adam,
            loss: LossFunction::Mse,
            learning_rate: 0.001,
            dropout: None,
            seed: 0,
        }
    }

    pub fn hidden_layers(mut self, sizes: &[usize]) -> Self {
        self.hidden = sizes.to_vec();
        self
    }

    pub fn hidden_activation(mut self, activation: Activation) -> Self {
        self.hidden_activation = activation;
        self
    }

    pub fn output_activation(mut self, activation: Activation) -> Self {
        self.output_activation = activation;
        self
    }

    pub fn initializer(mut self, initializer: WeightInit) -> Self {
        self.initializer = initializer;
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerKind) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn loss(mut self, loss: LossFunction) -> Self {
        self.loss = loss;
        self
    }

    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Dropout rate after hidden layers. `0.0` disables dropout.
    pub fn dropout(mut self, rate: f32) -> Self {
        self.dropout = if rate > 0.0 { Some(rate) } else { None };
        self
    }

    /// Seed for weight initialization and dropout masks
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build the neural network
    pub fn build(self) -> Result<NeuralNetwork> {
        if self.input_dim == 0 {
            return Err(BalanceError::invalid_parameter("input_dim", "must be positive"));
        }
        if self.output_dim == 0 {
            return Err(BalanceError::invalid_parameter("output_dim", "must be positive"));
        }
        if let Some(&width) = self.hidden.iter().find(|&&width| width == 0) {
            return Err(BalanceError::invalid_parameter(
                "hidden_dims",
                format!("layer width {} must be positive", width),
            ));
        }
        let dropout = self.dropout.map(Dropout::new).transpose()?;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut layers = Vec::with_capacity(self.hidden.len() + 1);
        let mut fan_in = self.input_dim;

        for (i, &width) in self.hidden.iter().enumerate() {
            let mut layer = DenseLayer::new(fan_in, width, self.hidden_activation, self.initializer, &mut rng)?;
            if i > 0 {
                if let Some(dropout) = dropout {
                    layer = layer.with_dropout(dropout);
                }
            }
            layers.push(layer);
            fan_in = width;
        }
        layers.push(DenseLayer::new(
            fan_in,
            self.output_dim,
            self.output_activation,
            self.initializer,
            &mut rng,
        )?);

        NeuralNetwork::new(
            layers,
            OptimizerWrapper::from_kind(self.optimizer),
            self.loss,
            self.learning_rate,
            self.seed.wrapping_add(1),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Estimator;

    #[test]
    fn test_network_builder() {
        let network = NetworkBuilder::new(4, 2)
            .hidden_layers(&[32, 32])
            .build()
            .unwrap();

        assert_eq!(network.layers.len(), 3);
        assert_eq!(network.input_dim(), 4);
        assert_eq!(network.output_dim(), 2);
        assert_eq!(network.layers[2].activation, Activation::Linear);
    }

    #[test]
    fn test_dropout_skips_first_hidden_layer() {
        let network = NetworkBuilder::new(4, 2)
            .hidden_layers(&[16, 32, 16])
            .dropout(0.1)
            .build()
            .unwrap();

        assert!(network.layers[0].dropout.is_none());
        assert!(network.layers[1].dropout.is_some());
        assert!(network.layers[2].dropout.is_some());
        assert!(network.layers[3].dropout.is_none());
    }

    #[test]
    fn test_same_seed_same_weights() {
        let a = NetworkBuilder::new(4, 2).hidden_layers(&[8]).seed(7).build().unwrap();
        let b = NetworkBuilder::new(4, 2).hidden_layers(&[8]).seed(7).build().unwrap();
        let c = NetworkBuilder::new(4, 2).hidden_layers(&[8]).seed(8).build().unwrap();

        assert_eq!(a.parameters(), b.parameters());
        assert_ne!(a.parameters(), c.parameters());
    }

    #[test]
    fn test_builder_errors() {
        assert!(NetworkBuilder::new(0, 2).build().is_err());
        assert!(NetworkBuilder::new(4, 0).build().is_err());
        assert!(NetworkBuilder::new(4, 2).hidden_layers(&[8, 0]).build().is_err());
        assert!(NetworkBuilder::new(4, 2).dropout(1.5).build().is_err());
    }
}
