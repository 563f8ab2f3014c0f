use ndarray::{Array1, ArrayView1, Axis};
use rand::rngs::StdRng;

use super::policy::{argmax, epsilon_greedy};
use crate::error::{BalanceError, Result};
use crate::estimator::Estimator;
use crate::replay_buffer::TransitionBatch;

/// Deep Q-Network agent with target network and Double DQN support
///
/// The online network is trained towards
/// `reward + (1 - done) * gamma * V'`, where `V'` is the target network's best
/// next-state value. With double DQN the online network picks the next action
/// and the target network scores it, which reduces overestimation.
#[derive(Clone)]
pub struct DqnAgent<E> {
    /// Network used for action selection and trained every update
    pub q_network: E,

    /// Periodically synced copy used to compute targets
    pub target_network: E,

    pub gamma: f32,

    pub use_double_dqn: bool,

    /// Number of updates performed
    pub train_steps: usize,
}

impl<E: Estimator + Clone> DqnAgent<E> {
    /// Create an agent whose target network starts as a copy of `q_network`.
    pub fn new(q_network: E, gamma: f32, use_double_dqn: bool) -> Result<Self> {
        let target_network = q_network.clone();
        Self::with_target(q_network, target_network, gamma, use_double_dqn)
    }
}

impl<E: Estimator> DqnAgent<E> {
    /// Create an agent from two estimators of the same shape. The target is
    /// immediately synced to the online network.
    pub fn with_target(q_network: E, target_network: E, gamma: f32, use_double_dqn: bool) -> Result<Self> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(BalanceError::invalid_parameter("gamma", format!("{} is outside [0, 1]", gamma)));
        }
        if q_network.output_dim() == 0 {
            return Err(BalanceError::invalid_parameter("q_network", "must output at least one action value"));
        }

        let mut agent = DqnAgent {
            q_network,
            target_network,
            gamma,
            use_double_dqn,
            train_steps: 0,
        };
        agent.sync_target()?;
        Ok(agent)
    }

    pub fn action_count(&self) -> usize {
        self.q_network.output_dim()
    }

    /// Epsilon-greedy action for a single state
    pub fn act(&self, state: ArrayView1<f32>, epsilon: f32, rng: &mut StdRng) -> Result<usize> {
        let q_values = self.q_network.infer_one(state)?;
        epsilon_greedy(q_values.view(), epsilon, rng)
    }

    /// Greedy action for a single state
    pub fn greedy_action(&self, state: ArrayView1<f32>) -> Result<usize> {
        let q_values = self.q_network.infer_one(state)?;
        argmax(q_values.view()).ok_or_else(|| BalanceError::NumericalError("all action values are NaN".to_string()))
    }

    /// Copy online parameters into the target network
    pub fn sync_target(&mut self) -> Result<()> {
        let parameters = self.q_network.parameters();
        self.target_network.set_parameters(&parameters)
    }

    /// One regression target per row of `batch`.
    pub fn compute_targets(&self, batch: &TransitionBatch) -> Result<Array1<f32>> {
        let next_target = self.target_network.infer(batch.next_states.view())?;

        let next_values: Array1<f32> = if self.use_double_dqn {
            let next_online = self.q_network.infer(batch.next_states.view())?;
            next_online
                .axis_iter(Axis(0))
                .zip(next_target.axis_iter(Axis(0)))
                .map(|(online_row, target_row)| {
                    argmax(online_row)
                        .map(|best| target_row[best])
                        .ok_or_else(|| BalanceError::NumericalError("all online next-state values are NaN".to_string()))
                })
                .collect::<Result<Vec<f32>>>()?
                .into()
        } else {
            next_target.map_axis(Axis(1), |row| row.fold(f32::NEG_INFINITY, |acc, &q| acc.max(q)))
        };

        Ok(&batch.rewards + &((1.0 - &batch.dones) * &next_values * self.gamma))
    }

    /// Fit the online network on one batch and return the loss.
    ///
    /// The regression target is the online network's own prediction with the
    /// taken action's entry replaced, so only taken actions contribute.
    pub fn learn(&mut self, batch: &TransitionBatch) -> Result<f32> {
        if batch.is_empty() {
            return Err(BalanceError::invalid_parameter("batch", "cannot learn from an empty batch"));
        }
        let action_count = self.action_count();
        if let Some(&action) = batch.actions.iter().find(|&&a| a >= action_count) {
            return Err(BalanceError::InvalidAction {
                action,
                max_actions: action_count,
            });
        }

        let targets = self.compute_targets(batch)?;
        let mut target_q_values = self.q_network.infer(batch.states.view())?;
        for (row, (&action, &target)) in batch.actions.iter().zip(targets.iter()).enumerate() {
            target_q_values[[row, action]] = target;
        }

        let loss = self.q_network.fit(batch.states.view(), target_q_values.view())?;
        self.train_steps += 1;
        Ok(loss)
    }
}
