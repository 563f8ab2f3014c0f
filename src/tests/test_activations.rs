use approx::assert_relative_eq;
use ndarray::array;

use crate::activations::Activation;

#[test]
fn test_relu_activation() {
    let mut input = array![[-1.0f32, 0.0, 1.0, 2.0]];
    Activation::Relu.apply_batch(&mut input);
    assert_eq!(input, array![[0.0f32, 0.0, 1.0, 2.0]]);
}

#[test]
fn test_sigmoid_and_tanh() {
    let mut input = array![[0.0]];
    Activation::Sigmoid.apply_batch(&mut input);
    assert_relative_eq!(input[[0, 0]], 0.5, epsilon = 1e-6);

    let mut input = array![[0.0]];
    Activation::Tanh.apply_batch(&mut input);
    assert_eq!(input[[0, 0]], 0.0);
}

#[test]
fn test_leaky_relu_and_elu() {
    let mut input = array![[-1.0, 0.0, 1.0]];
    Activation::LeakyRelu { alpha: 0.01 }.apply_batch(&mut input);
    assert_eq!(input, array![[-0.01f32, 0.0, 1.0]]);

    let mut input = array![[-1.0, 1.0]];
    Activation::Elu { alpha: 1.0 }.apply_batch(&mut input);
    assert_relative_eq!(input[[0, 0]], (-1.0f32).exp() - 1.0, epsilon = 1e-6);
    assert_eq!(input[[0, 1]], 1.0);
}

#[test]
fn test_derivatives() {
    let pre = array![[-2.0f32, 3.0]];
    assert_eq!(Activation::Relu.derivative_batch(pre.view()), array![[0.0f32, 1.0]]);
    assert_eq!(Activation::Linear.derivative_batch(pre.view()), array![[1.0f32, 1.0]]);
    assert_relative_eq!(
        Activation::Sigmoid.derivative_batch(array![[0.0f32]].view())[[0, 0]],
        0.25,
        epsilon = 1e-6
    );
}

#[test]
fn test_names_round_trip() {
    for name in ["relu", "linear", "sigmoid", "tanh", "leaky_relu", "elu"] {
        let activation: Activation = name.parse().unwrap();
        assert_eq!(activation.to_string(), name);
    }
    assert_eq!("identity".parse::<Activation>().unwrap(), Activation::Linear);
    assert!("softmax".parse::<Activation>().is_err());
}
