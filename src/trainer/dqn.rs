use tracing::{debug, info};

use super::TrainingState;
use crate::agent::DqnAgent;
use crate::config::DqnConfig;
use crate::context::TrainingContext;
use crate::env::Environment;
use crate::error::{BalanceError, Result};
use crate::estimator::Estimator;
use crate::metrics::{EpochRecord, TrainingCurves};
use crate::network::NeuralNetwork;
use crate::replay_buffer::{ExperienceReplay, Transition};
use crate::report::{Checkpoint, Reporter};
use crate::schedule::Schedule;

/// Summary of one call to [`DqnTrainer::collect_batch`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectStats {
    pub steps: usize,
    /// Episodes that reached a terminal step
    pub episodes: usize,
    /// Mean stored reward per completed episode, `None` if none completed
    pub mean_reward: Option<f32>,
    /// Mean length over completed episodes and the unfinished tail, if any
    pub mean_length: f32,
}

/// Greedy evaluation results, one entry per episode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub rewards: Vec<f32>,
    pub lengths: Vec<usize>,
}

impl Evaluation {
    pub fn mean_reward(&self) -> f32 {
        mean(&self.rewards)
    }

    pub fn mean_length(&self) -> f32 {
        let lengths: Vec<f32> = self.lengths.iter().map(|&l| l as f32).collect();
        mean(&lengths)
    }
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Result of [`DqnTrainer::train`]
#[derive(Debug, Clone)]
pub struct DqnOutcome {
    pub epochs_run: usize,
    pub solved: bool,
    pub running_avg_reward: Option<f32>,
    pub curves: TrainingCurves,
}

/// DQN training loop: epsilon-greedy collection into a replay buffer,
/// minibatch updates, periodic greedy evaluation and target sync.
pub struct DqnTrainer<Env, Est> {
    config: DqnConfig,
    env: Env,
    agent: DqnAgent<Est>,
    replay: ExperienceReplay,
    context: TrainingContext,
    lr_schedule: Schedule,
    state: TrainingState,
    curves: TrainingCurves,
}

impl<Env: Environment> DqnTrainer<Env, NeuralNetwork> {
    /// Build the Q-network described by `config` and wrap it in a trainer.
    pub fn from_config(config: DqnConfig, env: Env, mut context: TrainingContext) -> Result<Self> {
        config.validate()?;
        let q_network = config.build_q_network(env.observation_dim(), env.action_count(), context.derive_seed())?;
        Self::new(config, env, q_network, context)
    }
}

impl<Env: Environment, Est: Estimator + Clone> DqnTrainer<Env, Est> {
    pub fn new(config: DqnConfig, env: Env, q_network: Est, context: TrainingContext) -> Result<Self> {
        config.validate()?;
        if q_network.input_dim() != env.observation_dim() || q_network.output_dim() != env.action_count() {
            return Err(BalanceError::dimension_mismatch(
                format!("{} -> {}", env.observation_dim(), env.action_count()),
                format!("{} -> {}", q_network.input_dim(), q_network.output_dim()),
            ));
        }

        let mut agent = DqnAgent::new(q_network, config.gamma, config.double_dqn)?;
        agent.q_network.set_learning_rate(config.lr);
        let replay = ExperienceReplay::new(config.buffer_size)?;
        let lr_schedule = config.lr_schedule()?;
        let state = TrainingState::new(config.epsilon_bounds[0], config.lr, config.reward_window);

        Ok(DqnTrainer {
            config,
            env,
            agent,
            replay,
            context,
            lr_schedule,
            state,
            curves: TrainingCurves::new(),
        })
    }

    pub fn agent(&self) -> &DqnAgent<Est> {
        &self.agent
    }

    pub fn replay(&self) -> &ExperienceReplay {
        &self.replay
    }

    pub fn state(&self) -> &TrainingState {
        &self.state
    }

    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Step the environment with epsilon-greedy actions, storing every
    /// transition, until at least `n_steps` steps were taken and an episode
    /// ended (or `max_collect_steps` is reached).
    ///
    /// A terminal step that is not a time-limit truncation is stored with
    /// `terminal_penalty` as its reward.
    pub fn collect_batch(&mut self, n_steps: usize, epsilon: f32) -> Result<CollectStats> {
        let mut state = self.env.reset(self.context.rng_mut())?;
        let mut steps = 0;
        let mut episode_steps = 0;
        let mut episode_reward = 0.0;
        let mut completed_reward = 0.0;
        let mut lengths = Vec::new();

        while steps < self.config.max_collect_steps {
            let action = self.agent.act(state.view(), epsilon, self.context.rng_mut())?;
            let step = self.env.step(action)?;

            let reward = match self.config.terminal_penalty {
                Some(penalty) if step.done && !step.info.truncated => penalty,
                _ => step.reward,
            };
            self.replay.append(Transition {
                state,
                action,
                reward,
                next_state: step.next_state.clone(),
                done: step.done,
            });

            steps += 1;
            episode_steps += 1;
            episode_reward += reward;

            if step.done {
                lengths.push(episode_steps);
                completed_reward += episode_reward;
                episode_steps = 0;
                episode_reward = 0.0;
                state = self.env.reset(self.context.rng_mut())?;
                if steps >= n_steps {
                    break;
                }
            } else {
                state = step.next_state;
            }
        }

        let episodes = lengths.len();
        if episode_steps > 0 {
            lengths.push(episode_steps);
        }
        let mean_length = if lengths.is_empty() {
            0.0
        } else {
            lengths.iter().sum::<usize>() as f32 / lengths.len() as f32
        };
        let mean_reward = if episodes == 0 {
            None
        } else {
            Some(completed_reward / episodes as f32)
        };

        debug!("Collected {} steps over {} finished episodes", steps, episodes);
        Ok(CollectStats {
            steps,
            episodes,
            mean_reward,
            mean_length,
        })
    }

    /// Run `n_episodes` greedy episodes of at most `eval_max_steps` steps.
    pub fn evaluate(&mut self, n_episodes: usize) -> Result<Evaluation> {
        let mut evaluation = Evaluation::default();
        for _ in 0..n_episodes {
            let mut state = self.env.reset(self.context.rng_mut())?;
            let mut reward = 0.0;
            let mut length = 0;
            for _ in 0..self.config.eval_max_steps {
                let action = self.agent.greedy_action(state.view())?;
                let step = self.env.step(action)?;
                reward += step.reward;
                length += 1;
                if step.done {
                    break;
                }
                state = step.next_state;
            }
            evaluation.rewards.push(reward);
            evaluation.lengths.push(length);
        }
        Ok(evaluation)
    }

    /// `learning_epochs` minibatch updates; returns the mean loss.
    pub fn learn(&mut self) -> Result<f32> {
        let mut total = 0.0;
        for _ in 0..self.config.learning_epochs {
            let batch = self.replay.sample(self.config.batch_size, self.context.rng_mut())?;
            total += self.agent.learn(&batch)?;
        }
        Ok(total / self.config.learning_epochs as f32)
    }

    /// Set epsilon and the learning rate for `epoch`.
    pub fn update_schedules(&mut self, epoch: usize, epsilon_schedule: &Schedule) {
        self.state.epoch = epoch;
        self.state.epsilon = epsilon_schedule.value_at(epoch);
        self.state.learning_rate = self.lr_schedule.value_at(epoch);
        self.agent.q_network.set_learning_rate(self.state.learning_rate);
    }

    /// Copy the online network into the target, reset the online optimizer
    /// and re-apply the current learning rate.
    pub fn sync_target(&mut self) -> Result<()> {
        self.agent.sync_target()?;
        self.agent.q_network.reset_optimizer();
        self.agent.q_network.set_learning_rate(self.state.learning_rate);
        Ok(())
    }

    fn checkpoint(&self, step: usize, label: &str) -> Checkpoint {
        Checkpoint::new(step, label)
            .with_estimator("q_network", self.agent.q_network.parameters())
            .with_estimator("target_network", self.agent.target_network.parameters())
    }

    fn report(&mut self, epoch: usize, loss: f32, reporter: &mut Reporter<'_>) -> Result<()> {
        let evaluation = self.evaluate(self.config.eval_episodes)?;
        self.state.rewards.extend(evaluation.rewards.iter().copied());
        let running_avg_reward = self.state.rewards.mean().unwrap_or(0.0);

        let record = EpochRecord {
            epoch,
            loss,
            avg_reward: evaluation.mean_reward(),
            avg_length: evaluation.mean_length(),
            running_avg_reward,
            epsilon: self.state.epsilon,
            learning_rate: self.agent.q_network.learning_rate(),
        };
        reporter.scalars(
            epoch,
            &[
                ("loss", record.loss),
                ("avg_reward", record.avg_reward),
                ("avg_len", record.avg_length),
                ("running_avg_reward", record.running_avg_reward),
                ("epsilon", record.epsilon),
                ("learning_rate", record.learning_rate),
            ],
        )?;
        info!(
            "Epoch {} loss: {:.4} avg reward: {:.1} running avg: {:.1} epsilon: {:.3} lr: {:.5}",
            epoch, record.loss, record.avg_reward, record.running_avg_reward, record.epsilon, record.learning_rate
        );
        self.curves.record_epoch(record);
        Ok(())
    }

    /// Warm up the replay buffer with random actions, then train for up to
    /// `n_epochs` epochs or until the running evaluation reward exceeds
    /// `solved_threshold`.
    pub fn train(&mut self, n_epochs: usize, reporter: &mut Reporter<'_>) -> Result<DqnOutcome> {
        let [upper, lower] = self.config.epsilon_bounds;
        let epsilon_schedule = Schedule::epsilon(upper, lower, self.config.eps_decay_fraction, n_epochs)?;

        info!("Collecting {} decorrelation steps", self.config.min_steps_learn);
        let warmup = self.collect_batch(self.config.min_steps_learn, 1.0)?;
        debug!("Warm-up mean episode length {:.1}", warmup.mean_length);
        if self.replay.len() < self.config.batch_size {
            return Err(BalanceError::InsufficientSamples {
                requested: self.config.batch_size,
                available: self.replay.len(),
            });
        }

        info!("Training for {} epochs", n_epochs);
        let mut epochs_run = 0;
        for epoch in 0..n_epochs {
            self.update_schedules(epoch, &epsilon_schedule);
            self.collect_batch(self.config.steps_per_epoch, self.state.epsilon)?;
            let loss = self.learn()?;
            epochs_run = epoch + 1;

            if epoch % self.config.report_interval == 0 {
                self.report(epoch, loss, reporter)?;
            }
            if epoch % self.config.target_update_interval == 0 {
                self.sync_target()?;
            }
            if epoch % self.config.save_interval == 0 {
                let path = reporter.checkpoint(&self.checkpoint(epoch, "periodic"))?;
                debug!("Saved checkpoint {}", path.display());
            }

            if let Some(running) = self.state.rewards.mean() {
                if running > self.config.solved_threshold {
                    self.state.solved = true;
                    let path = reporter.checkpoint(&self.checkpoint(epoch, "solved"))?;
                    info!(
                        "Reached target at epoch {}: running avg reward {:.1}, saved {}",
                        epoch,
                        running,
                        path.display()
                    );
                    break;
                }
            }
        }

        if !self.state.solved && epochs_run > 0 {
            reporter.checkpoint(&self.checkpoint(epochs_run - 1, "final"))?;
        }
        reporter.flush()?;

        Ok(DqnOutcome {
            epochs_run,
            solved: self.state.solved,
            running_avg_reward: self.state.rewards.mean(),
            curves: self.curves.clone(),
        })
    }
}
