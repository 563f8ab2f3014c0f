use approx::assert_relative_eq;
use ndarray::array;

use crate::optimizer::{Adam, Optimizer, OptimizerKind, OptimizerWrapper, RMSProp, SGD};

#[test]
fn test_sgd_update_weights() {
    let mut sgd = SGD::new();
    let mut weights = array![[1.0, 1.0], [1.0, 1.0]];
    let gradients = array![[0.1, 0.2], [0.3, 0.4]];

    sgd.update_weights(0, &mut weights, &gradients, 0.01);

    let expected = array![[0.999f32, 0.998], [0.997, 0.996]];
    for (w, e) in weights.iter().zip(expected.iter()) {
        assert_relative_eq!(*w, *e, epsilon = 1e-6);
    }
}

#[test]
fn test_sgd_update_biases() {
    let mut sgd = SGD::new();
    let mut biases = array![1.0, 1.0];
    sgd.update_biases(0, &mut biases, &array![0.1, 0.2], 0.01);
    assert_relative_eq!(biases[0], 0.999, epsilon = 1e-6);
    assert_relative_eq!(biases[1], 0.998, epsilon = 1e-6);
}

#[test]
fn test_adam_first_step_moves_by_learning_rate() {
    // with bias correction the first Adam step is lr * sign(g)
    let mut adam = Adam::default();
    let mut weights = array![[1.0, 1.0]];
    adam.begin_step();
    adam.update_weights(0, &mut weights, &array![[0.5, -2.0]], 0.1);

    assert_relative_eq!(weights[[0, 0]], 0.9, epsilon = 1e-4);
    assert_relative_eq!(weights[[0, 1]], 1.1, epsilon = 1e-4);
    assert_eq!(adam.t, 1);
}

#[test]
fn test_adam_keeps_state_per_layer() {
    let mut adam = Adam::default();
    let mut first = array![[0.0]];
    let mut second = array![[0.0, 0.0]];

    adam.begin_step();
    adam.update_weights(0, &mut first, &array![[1.0]], 0.1);
    adam.update_weights(1, &mut second, &array![[1.0, 1.0]], 0.1);
    adam.begin_step();
    adam.update_weights(0, &mut first, &array![[1.0]], 0.1);

    assert_relative_eq!(first[[0, 0]], -0.2, epsilon = 1e-4);
    assert_relative_eq!(second[[0, 0]], -0.1, epsilon = 1e-4);
}

#[test]
fn test_reset_clears_moments() {
    let mut adam = OptimizerWrapper::Adam(Adam::default());
    let mut weights = array![[0.0]];
    adam.begin_step();
    adam.update_weights(0, &mut weights, &array![[1.0]], 0.1);
    adam.reset();

    if let OptimizerWrapper::Adam(ref inner) = adam {
        assert_eq!(inner.t, 0);
    } else {
        panic!("expected Adam");
    }

    // after reset the next step is again a full lr-sized step
    adam.begin_step();
    adam.update_weights(0, &mut weights, &array![[-1.0]], 0.1);
    assert_relative_eq!(weights[[0, 0]], 0.0, epsilon = 1e-4);
}

#[test]
fn test_rmsprop_update() {
    let mut rmsprop = RMSProp::default();
    let mut biases = array![1.0];
    rmsprop.update_biases(0, &mut biases, &array![0.5], 0.01);
    // v = 0.1 * 0.25, step = 0.5 / sqrt(0.025)
    assert_relative_eq!(biases[0], 1.0 - 0.01 * 0.5 / 0.025f32.sqrt(), epsilon = 1e-5);
}

#[test]
fn test_optimizer_kind_names() {
    assert_eq!("Adam".parse::<OptimizerKind>().unwrap(), OptimizerKind::Adam);
    assert_eq!("RMSprop".parse::<OptimizerKind>().unwrap(), OptimizerKind::RMSProp);
    assert_eq!("sgd".parse::<OptimizerKind>().unwrap(), OptimizerKind::SGD);
    assert!("adagrad".parse::<OptimizerKind>().is_err());
    assert_eq!(OptimizerWrapper::from_kind(OptimizerKind::RMSProp).kind(), OptimizerKind::RMSProp);
}
