use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;

use super::policy::{log_softmax_at, sample_categorical, softmax};
use crate::error::{BalanceError, Result};
use crate::estimator::Estimator;

/// Per-episode discount factor `I`: 1 at episode start, multiplied by gamma
/// after every non-terminal step, so after `k` steps it equals `gamma^k`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscountAccumulator {
    gamma: f32,
    value: f32,
}

impl DiscountAccumulator {
    pub fn new(gamma: f32) -> Self {
        DiscountAccumulator { gamma, value: 1.0 }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn advance(&mut self) {
        self.value *= self.gamma;
    }

    pub fn reset(&mut self) {
        self.value = 1.0;
    }
}

/// Value estimates and TD quantities for one transition
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TdStep {
    /// V(s)
    pub value: f32,
    /// V(s'), 0 for terminal transitions
    pub next_value: f32,
    pub target: f32,
    pub advantage: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepLosses {
    pub actor_loss: f32,
    pub critic_loss: f32,
}

/// One-step TD actor-critic.
///
/// The policy estimator outputs one logit per action; the value estimator
/// outputs a single state value. The advantage is a constant during both
/// updates.
#[derive(Clone)]
pub struct ActorCriticAgent<P, V> {
    pub policy: P,
    pub value: V,
    pub gamma: f32,
}

impl<P: Estimator, V: Estimator> ActorCriticAgent<P, V> {
    pub fn new(policy: P, value: V, gamma: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&gamma) {
            return Err(BalanceError::invalid_parameter("gamma", format!("{} is outside [0, 1]", gamma)));
        }
        if value.output_dim() != 1 {
            return Err(BalanceError::dimension_mismatch(
                "value estimator with 1 output".to_string(),
                format!("{} outputs", value.output_dim()),
            ));
        }
        if policy.input_dim() != value.input_dim() {
            return Err(BalanceError::dimension_mismatch(
                format!("value input of {}", policy.input_dim()),
                format!("{}", value.input_dim()),
            ));
        }
        Ok(ActorCriticAgent { policy, value, gamma })
    }

    pub fn action_count(&self) -> usize {
        self.policy.output_dim()
    }

    /// Softmax of the policy logits for `state`
    pub fn action_distribution(&self, state: ArrayView1<f32>) -> Result<Array1<f32>> {
        let logits = self.policy.infer_one(state)?;
        Ok(softmax(logits.view()))
    }

    /// Sample an action from the current policy
    pub fn act(&self, state: ArrayView1<f32>, rng: &mut StdRng) -> Result<usize> {
        let probs = self.action_distribution(state)?;
        sample_categorical(probs.view(), rng)
    }

    pub fn state_value(&self, state: ArrayView1<f32>) -> Result<f32> {
        Ok(self.value.infer_one(state)?[0])
    }

    /// `target = reward` if `done`, else `reward + gamma * V(s')`;
    /// `advantage = target - V(s)`.
    pub fn td_error(&self, state: ArrayView1<f32>, reward: f32, next_state: ArrayView1<f32>, done: bool) -> Result<TdStep> {
        let value = self.state_value(state)?;
        let next_value = if done { 0.0 } else { self.state_value(next_state)? };
        let target = if done { reward } else { reward + self.gamma * next_value };

        Ok(TdStep {
            value,
            next_value,
            target,
            advantage: target - value,
        })
    }

    /// Update the critic, and the actor when `update_actor` is set.
    ///
    /// Critic loss is `-advantage * I * V(s)`, actor loss is
    /// `-I * advantage * log pi(action | s)`. Both losses are returned even
    /// when the actor is frozen.
    pub fn update(
        &mut self,
        state: ArrayView1<f32>,
        action: usize,
        td: &TdStep,
        i_factor: f32,
        update_actor: bool,
    ) -> Result<StepLosses> {
        let action_count = self.action_count();
        if action >= action_count {
            return Err(BalanceError::InvalidAction {
                action,
                max_actions: action_count,
            });
        }
        let inputs = state.insert_axis(Axis(0));
        let scale = td.advantage * i_factor;

        let critic_loss = -scale * td.value;
        let critic_gradient = Array2::from_elem((1, 1), -scale);
        self.value.apply_gradients(inputs, critic_gradient.view())?;

        let logits = self.policy.infer_one(state)?;
        let actor_loss = -scale * log_softmax_at(logits.view(), action);
        if update_actor {
            let probs = softmax(logits.view());
            let mut actor_gradient = probs.mapv(|p| scale * p);
            actor_gradient[action] -= scale;
            self.policy.apply_gradients(inputs, actor_gradient.insert_axis(Axis(0)).view())?;
        }

        Ok(StepLosses { actor_loss, critic_loss })
    }
}
