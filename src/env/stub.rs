use ndarray::Array1;
use rand::rngs::StdRng;

use super::{Environment, Step, StepInfo};
use crate::error::{BalanceError, Result};

/// Deterministic environment: constant reward, episode ends after exactly
/// `episode_length` steps.
///
/// The observation is `[t, 1, 0, ...]` where `t` counts steps since reset, so
/// states along an episode are distinguishable.
#[derive(Clone, Debug)]
pub struct ConstantRewardEnv {
    observation_dim: usize,
    action_count: usize,
    reward: f32,
    episode_length: usize,
    truncate: bool,
    steps: usize,
}

impl ConstantRewardEnv {
    pub fn new(episode_length: usize, reward: f32) -> Self {
        ConstantRewardEnv {
            observation_dim: 4,
            action_count: 2,
            reward,
            episode_length,
            truncate: false,
            steps: 0,
        }
    }

    pub fn with_dims(mut self, observation_dim: usize, action_count: usize) -> Self {
        self.observation_dim = observation_dim.max(2);
        self.action_count = action_count;
        self
    }

    /// Report the final step as a time-limit truncation instead of failure
    pub fn truncating(mut self) -> Self {
        self.truncate = true;
        self
    }

    fn observation(&self) -> Array1<f32> {
        let mut state = Array1::zeros(self.observation_dim);
        state[0] = self.steps as f32;
        state[1] = 1.0;
        state
    }
}

impl Environment for ConstantRewardEnv {
    fn observation_dim(&self) -> usize {
        self.observation_dim
    }

    fn action_count(&self) -> usize {
        self.action_count
    }

    fn reset(&mut self, _rng: &mut StdRng) -> Result<Array1<f32>> {
        self.steps = 0;
        Ok(self.observation())
    }

    fn step(&mut self, action: usize) -> Result<Step> {
        if action >= self.action_count {
            return Err(BalanceError::InvalidAction {
                action,
                max_actions: self.action_count,
            });
        }
        self.steps += 1;
        let done = self.steps >= self.episode_length;
        Ok(Step {
            next_state: self.observation(),
            reward: self.reward,
            done,
            info: StepInfo {
                truncated: done && self.truncate,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_done_after_exactly_n_steps() {
        let mut env = ConstantRewardEnv::new(5, 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        env.reset(&mut rng).unwrap();

        let dones: Vec<bool> = (0..5).map(|_| env.step(0).unwrap().done).collect();
        assert_eq!(dones, vec![false, false, false, false, true]);
    }
}
