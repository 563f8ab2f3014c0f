use approx::assert_relative_eq;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

use crate::activations::Activation;
use crate::builders::NetworkBuilder;
use crate::estimator::Estimator;
use crate::layers::{DenseLayer, WeightInit};
use crate::loss::LossFunction;
use crate::network::NeuralNetwork;
use crate::optimizer::{OptimizerKind, OptimizerWrapper};

fn small_network(seed: u64) -> NeuralNetwork {
    NetworkBuilder::new(3, 2)
        .hidden_layers(&[8])
        .optimizer(OptimizerKind::SGD)
        .learning_rate(0.05)
        .seed(seed)
        .build()
        .unwrap()
}

#[test]
fn test_network_shapes() {
    let network = small_network(0);
    assert_eq!(network.input_dim(), 3);
    assert_eq!(network.output_dim(), 2);
    assert_eq!(network.layers.len(), 2);

    let outputs = network.infer(Array2::zeros((5, 3)).view()).unwrap();
    assert_eq!(outputs.shape(), [5, 2]);
}

#[test]
fn test_new_rejects_unchained_layers() {
    let mut rng = StdRng::seed_from_u64(0);
    let first = DenseLayer::new(3, 4, Activation::Relu, WeightInit::HeNormal, &mut rng).unwrap();
    let second = DenseLayer::new(5, 1, Activation::Linear, WeightInit::HeNormal, &mut rng).unwrap();

    let result = NeuralNetwork::new(
        vec![first, second],
        OptimizerWrapper::from_kind(OptimizerKind::Adam),
        LossFunction::Mse,
        0.01,
        0,
    );
    assert!(result.is_err());
    assert!(NeuralNetwork::new(Vec::new(), OptimizerWrapper::from_kind(OptimizerKind::Adam), LossFunction::Mse, 0.01, 0).is_err());
}

#[test]
fn test_infer_rejects_wrong_width() {
    let network = small_network(0);
    assert!(network.infer(Array2::zeros((1, 4)).view()).is_err());
    assert!(network.infer_one(array![1.0, 2.0].view()).is_err());
}

#[test]
fn test_fit_reduces_loss() {
    let mut network = small_network(1);
    let inputs = array![[0.0, 0.5, 1.0], [1.0, 0.0, -1.0], [0.3, 0.3, 0.3]];
    let targets = array![[1.0, -1.0], [0.0, 2.0], [0.5, 0.5]];

    let first = network.fit(inputs.view(), targets.view()).unwrap();
    let mut last = first;
    for _ in 0..200 {
        last = network.fit(inputs.view(), targets.view()).unwrap();
    }
    assert!(last < first * 0.5, "loss went from {} to {}", first, last);
}

#[test]
fn test_fit_rejects_mismatched_targets() {
    let mut network = small_network(1);
    let inputs = Array2::zeros((2, 3));
    assert!(network.fit(inputs.view(), Array2::zeros((2, 3)).view()).is_err());
    assert!(network.fit(inputs.view(), Array2::zeros((1, 2)).view()).is_err());
}

#[test]
fn test_apply_gradients_moves_output_downhill() {
    let mut network = small_network(2);
    let inputs = array![[0.2, -0.1, 0.4]];
    let before = network.infer(inputs.view()).unwrap();

    // descending along +1 on output 0 must lower that output
    network
        .apply_gradients(inputs.view(), array![[1.0, 0.0]].view())
        .unwrap();
    let after = network.infer(inputs.view()).unwrap();

    assert!(after[[0, 0]] < before[[0, 0]]);
}

#[test]
fn test_parameters_round_trip_between_networks() {
    let source = small_network(3);
    let mut copy = small_network(4);
    assert_ne!(source.parameters(), copy.parameters());

    copy.set_parameters(&source.parameters()).unwrap();
    assert_eq!(source.parameters(), copy.parameters());
    assert_eq!(source.parameters().count(), 3 * 8 + 8 + 8 * 2 + 2);

    let other = NetworkBuilder::new(3, 2).hidden_layers(&[4]).build().unwrap();
    assert!(copy.set_parameters(&other.parameters()).is_err());
}

#[test]
fn test_same_seed_same_network() {
    assert_eq!(small_network(9).parameters(), small_network(9).parameters());
}

#[test]
fn test_learning_rate_accessors() {
    let mut network = small_network(0);
    assert_relative_eq!(network.learning_rate(), 0.05);
    network.set_learning_rate(0.001);
    assert_relative_eq!(network.learning_rate(), 0.001);
}

#[test]
fn test_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.bin");
    let network = small_network(5);
    network.save(&path).unwrap();

    let loaded = NeuralNetwork::load(&path).unwrap();
    assert_eq!(loaded.parameters(), network.parameters());

    let inputs = array![[0.1, 0.2, 0.3]];
    assert_eq!(loaded.infer(inputs.view()).unwrap(), network.infer(inputs.view()).unwrap());
}

#[test]
fn test_reseeded_networks_train_identically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("network.bin");
    NetworkBuilder::new(3, 2)
        .hidden_layers(&[16, 16])
        .dropout(0.5)
        .seed(6)
        .build()
        .unwrap()
        .save(&path)
        .unwrap();

    let mut first = NeuralNetwork::load(&path).unwrap();
    let mut second = NeuralNetwork::load(&path).unwrap();
    first.reseed(11);
    second.reseed(11);

    let inputs = array![[0.5, -0.5, 1.0], [1.0, 0.2, -0.3]];
    let targets = array![[1.0, 0.0], [0.0, 1.0]];
    for _ in 0..5 {
        let a = first.fit(inputs.view(), targets.view()).unwrap();
        let b = second.fit(inputs.view(), targets.view()).unwrap();
        assert_eq!(a, b);
    }
    assert_eq!(first.parameters(), second.parameters());
}
