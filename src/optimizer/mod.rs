//! Gradient-descent optimizers with per-layer state.
//!
//! Moment buffers are created lazily the first time a layer index is updated
//! and are dropped by [`Optimizer::reset`], which the DQN trainer calls every
//! time the target network is synced.

use ndarray::{Array1, Array2, Dimension, Array};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BalanceError;

pub trait Optimizer {
    /// Advance the optimizer's time step. Called once per parameter update.
    fn begin_step(&mut self) {}
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32);
    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32);
    /// Forget all accumulated state.
    fn reset(&mut self) {}
}

/// Optimizer names accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OptimizerKind {
    #[default]
    Adam,
    RMSProp,
    SGD,
}

impl FromStr for OptimizerKind {
    type Err = BalanceError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_ascii_lowercase().as_str() {
            "adam" => Ok(OptimizerKind::Adam),
            "rmsprop" => Ok(OptimizerKind::RMSProp),
            "sgd" => Ok(OptimizerKind::SGD),
            other => Err(BalanceError::invalid_parameter(
                "optimizer_name",
                format!("unknown optimizer '{}'", other),
            )),
        }
    }
}

impl fmt::Display for OptimizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerKind::Adam => f.write_str("Adam"),
            OptimizerKind::RMSProp => f.write_str("RMSprop"),
            OptimizerKind::SGD => f.write_str("SGD"),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
    RMSProp(RMSProp),
}

impl OptimizerWrapper {
    /// Build an optimizer with the usual default hyperparameters.
    pub fn from_kind(kind: OptimizerKind) -> Self {
        match kind {
            OptimizerKind::SGD => OptimizerWrapper::SGD(SGD::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
            OptimizerKind::RMSProp => OptimizerWrapper::RMSProp(RMSProp::default()),
        }
    }

    pub fn kind(&self) -> OptimizerKind {
        match self {
            OptimizerWrapper::SGD(_) => OptimizerKind::SGD,
            OptimizerWrapper::Adam(_) => OptimizerKind::Adam,
            OptimizerWrapper::RMSProp(_) => OptimizerKind::RMSProp,
        }
    }
}

impl Optimizer for OptimizerWrapper {
    fn begin_step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.begin_step(),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.begin_step(),
        }
    }

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_weights(layer, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.update_biases(layer, biases, gradients, learning_rate),
        }
    }

    fn reset(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.reset(),
            OptimizerWrapper::Adam(optimizer) => optimizer.reset(),
            OptimizerWrapper::RMSProp(optimizer) => optimizer.reset(),
        }
    }
}

/// Return the state slot for `layer`, (re)creating it with zeros when it is
/// missing or shaped differently from `like`.
fn slot<'a, D: Dimension>(
    states: &'a mut Vec<Option<Array<f32, D>>>,
    layer: usize,
    like: &Array<f32, D>,
) -> &'a mut Array<f32, D> {
    if states.len() <= layer {
        states.resize_with(layer + 1, || None);
    }
    let entry = &mut states[layer];
    let stale = entry.as_ref().map_or(true, |state| state.shape() != like.shape());
    if stale {
        *entry = Some(Array::zeros(like.raw_dim()));
    }
    entry.get_or_insert_with(|| Array::zeros(like.raw_dim()))
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    m_weights: Vec<Option<Array2<f32>>>,
    v_weights: Vec<Option<Array2<f32>>>,
    m_biases: Vec<Option<Array1<f32>>>,
    v_biases: Vec<Option<Array1<f32>>>,
    pub t: i32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            m_weights: Vec::new(),
            v_weights: Vec::new(),
            m_biases: Vec::new(),
            v_biases: Vec::new(),
            t: 0,
        }
    }

    fn bias_corrections(&self) -> (f32, f32) {
        let t = self.t.max(1);
        (1.0 - self.beta1.powi(t), 1.0 - self.beta2.powi(t))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-7)
    }
}

impl Optimizer for Adam {
    fn begin_step(&mut self) {
        self.t += 1;
    }

    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.bias_corrections();

        let m = slot(&mut self.m_weights, layer, gradients);
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let m_hat = m.mapv(|x| x / c1);

        let v = slot(&mut self.v_weights, layer, gradients);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);
        let v_hat = v.mapv(|x| x / c2);

        *weights -= &((&m_hat / (v_hat.mapv(f32::sqrt) + epsilon)) * learning_rate);
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta1, beta2, epsilon) = (self.beta1, self.beta2, self.epsilon);
        let (c1, c2) = self.bias_corrections();

        let m = slot(&mut self.m_biases, layer, gradients);
        m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        let m_hat = m.mapv(|x| x / c1);

        let v = slot(&mut self.v_biases, layer, gradients);
        v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);
        let v_hat = v.mapv(|x| x / c2);

        *biases -= &((&m_hat / (v_hat.mapv(f32::sqrt) + epsilon)) * learning_rate);
    }

    fn reset(&mut self) {
        self.m_weights.clear();
        self.v_weights.clear();
        self.m_biases.clear();
        self.v_biases.clear();
        self.t = 0;
    }
}

/// RMSProp optimizer
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RMSProp {
    pub beta: f32,
    pub epsilon: f32,
    v_weights: Vec<Option<Array2<f32>>>,
    v_biases: Vec<Option<Array1<f32>>>,
}

impl RMSProp {
    pub fn new(beta: f32, epsilon: f32) -> Self {
        RMSProp {
            beta,
            epsilon,
            v_weights: Vec::new(),
            v_biases: Vec::new(),
        }
    }
}

impl Default for RMSProp {
    fn default() -> Self {
        Self::new(0.9, 1e-7)
    }
}

impl Optimizer for RMSProp {
    fn update_weights(&mut self, layer: usize, weights: &mut Array2<f32>, gradients: &Array2<f32>, learning_rate: f32) {
        let (beta, epsilon) = (self.beta, self.epsilon);
        let v = slot(&mut self.v_weights, layer, gradients);
        v.zip_mut_with(gradients, |v, &g| *v = beta * *v + (1.0 - beta) * g * g);
        *weights -= &((gradients / &(v.mapv(f32::sqrt) + epsilon)) * learning_rate);
    }

    fn update_biases(&mut self, layer: usize, biases: &mut Array1<f32>, gradients: &Array1<f32>, learning_rate: f32) {
        let (beta, epsilon) = (self.beta, self.epsilon);
        let v = slot(&mut self.v_biases, layer, gradients);
        v.zip_mut_with(gradients, |v, &g| *v = beta * *v + (1.0 - beta) * g * g);
        *biases -= &((gradients / &(v.mapv(f32::sqrt) + epsilon)) * learning_rate);
    }

    fn reset(&mut self) {
        self.v_weights.clear();
        self.v_biases.clear();
    }
}
