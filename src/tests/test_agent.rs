use approx::assert_relative_eq;
use ndarray::{array, Array1, Array2, ArrayView2};

use crate::agent::actor_critic::{ActorCriticAgent, DiscountAccumulator};
use crate::agent::DqnAgent;
use crate::error::{BalanceError, Result};
use crate::estimator::{Estimator, LayerParameters, Parameters};
use crate::replay_buffer::{Transition, TransitionBatch};

/// Returns the same output row for every input and records every update.
#[derive(Clone)]
pub(crate) struct FixedEstimator {
    pub(crate) input_dim: usize,
    pub(crate) outputs: Array1<f32>,
    pub(crate) fitted: Vec<(Array2<f32>, Array2<f32>)>,
    pub(crate) gradients: Vec<Array2<f32>>,
    pub(crate) learning_rate: f32,
}

impl FixedEstimator {
    pub(crate) fn new(input_dim: usize, outputs: Array1<f32>) -> Self {
        FixedEstimator {
            input_dim,
            outputs,
            fitted: Vec::new(),
            gradients: Vec::new(),
            learning_rate: 0.01,
        }
    }
}

impl Estimator for FixedEstimator {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.outputs.len()
    }

    fn infer(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        let mut outputs = Array2::zeros((inputs.nrows(), self.outputs.len()));
        for mut row in outputs.rows_mut() {
            row.assign(&self.outputs);
        }
        Ok(outputs)
    }

    fn fit(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.fitted.push((inputs.to_owned(), targets.to_owned()));
        Ok(0.0)
    }

    fn apply_gradients(&mut self, _inputs: ArrayView2<f32>, output_gradients: ArrayView2<f32>) -> Result<()> {
        self.gradients.push(output_gradients.to_owned());
        Ok(())
    }

    fn parameters(&self) -> Parameters {
        Parameters {
            layers: vec![LayerParameters {
                weights: Array2::zeros((self.input_dim, self.outputs.len())),
                biases: self.outputs.clone(),
            }],
        }
    }

    fn set_parameters(&mut self, parameters: &Parameters) -> Result<()> {
        self.outputs.assign(&parameters.layers[0].biases);
        Ok(())
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }

    fn reset_optimizer(&mut self) {}
}

fn transition(action: usize, reward: f32, done: bool) -> Transition {
    Transition {
        state: array![0.0, 0.0],
        action,
        reward,
        next_state: array![1.0, 1.0],
        done,
    }
}

fn batch_of(transitions: &[Transition]) -> TransitionBatch {
    let refs: Vec<&Transition> = transitions.iter().collect();
    TransitionBatch::from_transitions(&refs).unwrap()
}

fn dqn_agent(online: Array1<f32>, target: Array1<f32>, double: bool) -> DqnAgent<FixedEstimator> {
    let mut agent = DqnAgent::new(FixedEstimator::new(2, online), 0.5, double).unwrap();
    agent.target_network.outputs = target;
    agent
}

#[test]
fn test_construction_syncs_target() {
    let agent = DqnAgent::with_target(
        FixedEstimator::new(2, array![1.0, 2.0]),
        FixedEstimator::new(2, array![7.0, 7.0]),
        0.9,
        true,
    )
    .unwrap();
    assert_eq!(agent.target_network.outputs, array![1.0f32, 2.0]);
}

#[test]
fn test_gamma_outside_unit_interval_rejected() {
    assert!(DqnAgent::new(FixedEstimator::new(2, array![0.0, 0.0]), 1.5, false).is_err());
}

#[test]
fn test_double_dqn_selects_with_online_and_evaluates_with_target() {
    let agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], true);
    let targets = agent.compute_targets(&batch_of(&[transition(0, 1.0, false)])).unwrap();
    // online argmax is action 1, valued by the target network at 2.0
    assert_relative_eq!(targets[0], 1.0 + 0.5 * 2.0);
}

#[test]
fn test_vanilla_dqn_uses_target_max() {
    let agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], false);
    let targets = agent.compute_targets(&batch_of(&[transition(0, 1.0, false)])).unwrap();
    assert_relative_eq!(targets[0], 1.0 + 0.5 * 10.0);
}

#[test]
fn test_terminal_target_is_reward() {
    for double in [true, false] {
        let agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], double);
        let targets = agent
            .compute_targets(&batch_of(&[transition(1, -1.0, true), transition(0, 1.0, false)]))
            .unwrap();
        assert_relative_eq!(targets[0], -1.0);
        assert!(targets[1] > 1.0);
    }
}

#[test]
fn test_learn_only_changes_taken_action() {
    let mut agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], true);
    agent
        .learn(&batch_of(&[transition(0, 3.0, true), transition(1, 0.0, false)]))
        .unwrap();

    assert_eq!(agent.train_steps, 1);
    let (_, fitted_targets) = &agent.q_network.fitted[0];
    assert_eq!(fitted_targets.row(0).to_vec(), vec![3.0f32, 5.0]);
    assert_eq!(fitted_targets.row(1).to_vec(), vec![1.0f32, 1.0]);
}

#[test]
fn test_learn_rejects_out_of_range_action() {
    let mut agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], true);
    let err = agent.learn(&batch_of(&[transition(2, 0.0, false)])).unwrap_err();
    assert!(matches!(err, BalanceError::InvalidAction { action: 2, max_actions: 2 }));
    assert!(agent.q_network.fitted.is_empty());
}

#[test]
fn test_greedy_action() {
    let agent = dqn_agent(array![1.0, 5.0], array![10.0, 2.0], true);
    assert_eq!(agent.greedy_action(array![0.0, 0.0].view()).unwrap(), 1);
}

#[test]
fn test_discount_accumulator_powers() {
    let mut discount = DiscountAccumulator::new(0.9);
    for k in 0..10 {
        assert_relative_eq!(discount.value(), 0.9f32.powi(k), epsilon = 1e-6);
        discount.advance();
    }
    discount.reset();
    assert_eq!(discount.value(), 1.0);
}

fn actor_critic(value: f32) -> ActorCriticAgent<FixedEstimator, FixedEstimator> {
    ActorCriticAgent::new(
        FixedEstimator::new(2, array![0.0, 0.0]),
        FixedEstimator::new(2, array![value]),
        0.9,
    )
    .unwrap()
}

#[test]
fn test_actor_critic_rejects_multi_output_value() {
    let result = ActorCriticAgent::new(
        FixedEstimator::new(2, array![0.0, 0.0]),
        FixedEstimator::new(2, array![0.0, 0.0]),
        0.9,
    );
    assert!(result.is_err());
}

#[test]
fn test_td_error_bootstraps_unless_done() {
    let agent = actor_critic(2.0);
    let state = array![0.0, 0.0];

    let td = agent.td_error(state.view(), 1.0, state.view(), false).unwrap();
    assert_relative_eq!(td.target, 1.0 + 0.9 * 2.0);
    assert_relative_eq!(td.advantage, 0.8, epsilon = 1e-6);

    let td = agent.td_error(state.view(), 1.0, state.view(), true).unwrap();
    assert_eq!(td.next_value, 0.0);
    assert_relative_eq!(td.target, 1.0);
    assert_relative_eq!(td.advantage, -1.0);
}

#[test]
fn test_update_gradients() {
    let mut agent = actor_critic(2.0);
    let state = array![0.0, 0.0];
    let td = agent.td_error(state.view(), 1.0, state.view(), false).unwrap();

    let losses = agent.update(state.view(), 0, &td, 0.5, true).unwrap();

    // scale = advantage * I = 0.4
    assert_relative_eq!(agent.value.gradients[0][[0, 0]], -0.4, epsilon = 1e-6);
    let actor = &agent.policy.gradients[0];
    assert_relative_eq!(actor[[0, 0]], -0.2, epsilon = 1e-6);
    assert_relative_eq!(actor[[0, 1]], 0.2, epsilon = 1e-6);
    assert_relative_eq!(losses.actor_loss, -0.4 * 0.5f32.ln(), epsilon = 1e-6);
    assert_relative_eq!(losses.critic_loss, -0.4 * 2.0, epsilon = 1e-6);
}

#[test]
fn test_frozen_actor_still_trains_critic() {
    let mut agent = actor_critic(2.0);
    let state = array![0.0, 0.0];
    let td = agent.td_error(state.view(), 1.0, state.view(), false).unwrap();

    agent.update(state.view(), 1, &td, 1.0, false).unwrap();
    assert_eq!(agent.value.gradients.len(), 1);
    assert!(agent.policy.gradients.is_empty());
    assert!(agent.update(state.view(), 5, &td, 1.0, false).is_err());
}
