//! Environments the trainers interact with.
//!
//! The trainers only depend on the [`Environment`] trait. [`CartPole`] is the
//! classic cart-pole balancing task; [`ConstantRewardEnv`] is a deterministic
//! stub used to pin down the shape of training updates in tests.

pub mod cartpole;
pub mod stub;

pub use cartpole::CartPole;
pub use stub::ConstantRewardEnv;

use ndarray::Array1;
use rand::rngs::StdRng;

use crate::error::Result;

/// Extra information returned with each step
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepInfo {
    /// The episode ended because of the step limit, not because of failure
    pub truncated: bool,
}

/// Result of one environment step
#[derive(Clone, Debug)]
pub struct Step {
    pub next_state: Array1<f32>,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// A discrete-action, vector-observation environment
pub trait Environment {
    fn observation_dim(&self) -> usize;

    fn action_count(&self) -> usize;

    /// Start a new episode and return the initial observation.
    fn reset(&mut self, rng: &mut StdRng) -> Result<Array1<f32>>;

    /// Advance one step with `action`.
    fn step(&mut self, action: usize) -> Result<Step>;
}
