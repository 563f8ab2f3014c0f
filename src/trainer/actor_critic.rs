use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::TrainingState;
use crate::agent::{ActorCriticAgent, DiscountAccumulator};
use crate::config::ActorCriticConfig;
use crate::context::TrainingContext;
use crate::env::Environment;
use crate::error::{BalanceError, Result};
use crate::estimator::Estimator;
use crate::metrics::{EpisodeRecord, RollingWindow, TrainingCurves};
use crate::network::NeuralNetwork;
use crate::report::{Checkpoint, Reporter};

/// Result of [`ActorCriticTrainer::train`]. The solving episode, if any, is
/// not part of the per-episode series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorCriticOutcome {
    pub last_episode: usize,
    pub solved: bool,
    pub rewards: Vec<f32>,
    pub mean_rewards: Vec<f32>,
    pub losses: Vec<f32>,
}

impl ActorCriticOutcome {
    pub fn curves(&self) -> TrainingCurves {
        let mut curves = TrainingCurves::new();
        for (episode, ((&reward, &rolling_mean), &loss)) in self
            .rewards
            .iter()
            .zip(&self.mean_rewards)
            .zip(&self.losses)
            .enumerate()
        {
            curves.record_episode(EpisodeRecord {
                episode,
                reward,
                rolling_mean,
                loss,
            });
        }
        curves
    }
}

/// Episode loop for one-step TD actor-critic
pub struct ActorCriticTrainer<Env, P, V> {
    config: ActorCriticConfig,
    env: Env,
    agent: ActorCriticAgent<P, V>,
    context: TrainingContext,
    state: TrainingState,
    stable_window: RollingWindow,
    stable: bool,
}

impl<Env: Environment> ActorCriticTrainer<Env, NeuralNetwork, NeuralNetwork> {
    /// Build policy and value networks described by `config`.
    pub fn from_config(config: ActorCriticConfig, env: Env, mut context: TrainingContext) -> Result<Self> {
        config.validate()?;
        let policy = config.build_policy(env.observation_dim(), env.action_count(), context.derive_seed())?;
        let value = config.build_value(env.observation_dim(), context.derive_seed())?;
        Self::new(config, env, policy, value, context)
    }
}

impl<Env: Environment, P: Estimator, V: Estimator> ActorCriticTrainer<Env, P, V> {
    pub fn new(config: ActorCriticConfig, env: Env, policy: P, value: V, context: TrainingContext) -> Result<Self> {
        config.validate()?;
        if policy.input_dim() != env.observation_dim() || policy.output_dim() != env.action_count() {
            return Err(BalanceError::dimension_mismatch(
                format!("policy {} -> {}", env.observation_dim(), env.action_count()),
                format!("policy {} -> {}", policy.input_dim(), policy.output_dim()),
            ));
        }
        let agent = ActorCriticAgent::new(policy, value, config.gamma)?;
        let state = TrainingState::new(0.0, config.policy_lr, config.solved_window);
        let stable_window = RollingWindow::new(config.stable_window);

        Ok(ActorCriticTrainer {
            config,
            env,
            agent,
            context,
            state,
            stable_window,
            stable: false,
        })
    }

    pub fn agent(&self) -> &ActorCriticAgent<P, V> {
        &self.agent
    }

    /// Whether the actor is frozen
    pub fn is_stable(&self) -> bool {
        self.stable
    }

    fn checkpoint(&self, episode: usize, label: &str) -> Checkpoint {
        Checkpoint::new(episode, label)
            .with_estimator("policy", self.agent.policy.parameters())
            .with_estimator("value", self.agent.value.parameters())
    }

    /// Train until the trailing mean reward exceeds `solved_threshold` or
    /// `max_episodes` episodes have run.
    pub fn train(&mut self, reporter: &mut Reporter<'_>) -> Result<ActorCriticOutcome> {
        let mut rewards = Vec::new();
        let mut mean_rewards = Vec::new();
        let mut losses = Vec::new();
        let mut discount = DiscountAccumulator::new(self.config.gamma);
        let mut last_episode = 0;

        for episode in 0..self.config.max_episodes {
            last_episode = episode;
            self.state.episode = episode;
            let mut state = self.env.reset(self.context.rng_mut())?;
            discount.reset();
            let mut episode_reward = 0.0;
            let mut actor_loss = 0.0;
            let mut critic_loss = 0.0;

            for _ in 0..self.config.max_steps {
                let action = match self.agent.act(state.view(), self.context.rng_mut()) {
                    Ok(action) => action,
                    Err(e) => {
                        warn!("Episode {}: could not sample an action: {}", episode, e);
                        continue;
                    }
                };
                let step = match self.env.step(action) {
                    Ok(step) => step,
                    Err(e) => {
                        warn!("Episode {}: environment step failed: {}", episode, e);
                        continue;
                    }
                };
                episode_reward += step.reward;

                let td = self
                    .agent
                    .td_error(state.view(), step.reward, step.next_state.view(), step.done)?;
                let step_losses = self
                    .agent
                    .update(state.view(), action, &td, discount.value(), !self.stable)?;
                actor_loss = step_losses.actor_loss;
                critic_loss = step_losses.critic_loss;

                if step.done {
                    break;
                }
                discount.advance();
                state = step.next_state;
            }

            self.state.rewards.push(episode_reward);
            self.stable_window.push(episode_reward);
            let average = self.state.rewards.full_mean().unwrap_or(0.0);
            if !self.stable {
                if let Some(recent) = self.stable_window.full_mean() {
                    if recent > self.config.solved_threshold {
                        self.stable = true;
                        info!("Episode {}: policy is stable, freezing actor", episode);
                    }
                }
            }
            info!(
                "Episode {} Reward: {} Average over {} episodes: {:.2}",
                episode, episode_reward, self.config.solved_window, average
            );

            if average > self.config.solved_threshold {
                self.state.solved = true;
                let path = reporter.checkpoint(&self.checkpoint(episode, "solved"))?;
                info!("Solved at episode {}, saved {}", episode, path.display());
                break;
            }

            reporter.scalars(
                episode,
                &[
                    ("episode_reward", episode_reward),
                    ("mean_reward", average),
                    ("actor_loss", actor_loss),
                    ("critic_loss", critic_loss),
                ],
            )?;
            rewards.push(episode_reward);
            mean_rewards.push(average);
            losses.push(actor_loss);

            if (episode + 1) % self.config.save_interval == 0 {
                let path = reporter.checkpoint(&self.checkpoint(episode, "periodic"))?;
                debug!("Saved checkpoint {}", path.display());
            }
        }

        reporter.flush()?;
        Ok(ActorCriticOutcome {
            last_episode,
            solved: self.state.solved,
            rewards,
            mean_rewards,
            losses,
        })
    }
}
