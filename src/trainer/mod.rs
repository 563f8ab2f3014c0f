//! Training loops.
//!
//! A trainer owns an environment, an agent and a [`TrainingContext`]
//! (the seeded random source) and reports through an injected
//! [`Reporter`](crate::report::Reporter).
//!
//! [`TrainingContext`]: crate::context::TrainingContext

pub mod actor_critic;
pub mod dqn;

pub use actor_critic::{ActorCriticOutcome, ActorCriticTrainer};
pub use dqn::{CollectStats, DqnOutcome, DqnTrainer, Evaluation};

use serde::{Deserialize, Serialize};

use crate::metrics::RollingWindow;

/// Mutable bookkeeping shared by the loops, updated once per epoch or episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingState {
    pub epsilon: f32,
    pub learning_rate: f32,
    pub epoch: usize,
    pub episode: usize,
    /// Most recent rewards used by the stopping criterion
    pub rewards: RollingWindow,
    pub solved: bool,
}

impl TrainingState {
    pub fn new(epsilon: f32, learning_rate: f32, reward_window: usize) -> Self {
        TrainingState {
            epsilon,
            learning_rate,
            epoch: 0,
            episode: 0,
            rewards: RollingWindow::new(reward_window),
            solved: false,
        }
    }
}
