//! Hyperparameters for the two training programs.
//!
//! Both configs are plain serde structs: the binaries fill them from command
//! line flags (optionally starting from a JSON file), validate them, and write
//! the resolved values to `params.json` in the run directory.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::builders::NetworkBuilder;
use crate::error::{BalanceError, Result};
use crate::layers::WeightInit;
use crate::loss::LossFunction;
use crate::network::NeuralNetwork;
use crate::optimizer::OptimizerKind;
use crate::schedule::Schedule;

fn check_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(BalanceError::invalid_parameter(name, "must be positive"));
    }
    Ok(())
}

fn check_unit_interval(name: &str, value: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(BalanceError::invalid_parameter(name, format!("{} is outside [0, 1]", value)));
    }
    Ok(())
}

fn check_learning_rate(name: &str, value: f32) -> Result<()> {
    if !(value > 0.0 && value.is_finite()) {
        return Err(BalanceError::invalid_parameter(name, format!("{} must be positive", value)));
    }
    Ok(())
}

fn check_hidden(name: &str, dims: &[usize]) -> Result<()> {
    if dims.is_empty() || dims.contains(&0) {
        return Err(BalanceError::invalid_parameter(
            name,
            format!("{:?} must be a non-empty list of positive widths", dims),
        ));
    }
    Ok(())
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// DQN training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub double_dqn: bool,
    pub hidden_dims: Vec<usize>,
    pub lr: f32,
    pub min_lr: f32,
    pub lr_decay: f32,
    /// `[upper, lower]`
    pub epsilon_bounds: [f32; 2],
    pub eps_decay_fraction: f32,
    pub gamma: f32,
    /// Minibatch updates per epoch
    pub learning_epochs: usize,
    pub batch_size: usize,
    pub target_update_interval: usize,
    pub steps_per_epoch: usize,
    pub buffer_size: usize,
    pub min_steps_learn: usize,
    pub inner_activation: Activation,
    pub final_activation: Activation,
    pub optimizer: OptimizerKind,
    pub loss: LossFunction,
    pub dropout: f32,
    pub kernel_initializer: WeightInit,
    pub report_interval: usize,
    pub save_interval: usize,
    pub solved_threshold: f32,
    /// Reward stored for a failing terminal step; `None` keeps the real reward
    pub terminal_penalty: Option<f32>,
    pub eval_episodes: usize,
    pub eval_max_steps: usize,
    /// Number of evaluation rewards averaged by the stopping criterion
    pub reward_window: usize,
    pub max_collect_steps: usize,
    pub epochs: usize,
    pub seed: u64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        DqnConfig {
            double_dqn: false,
            hidden_dims: vec![16, 32, 32, 16, 16],
            lr: 0.01,
            min_lr: 0.001,
            lr_decay: 0.999,
            epsilon_bounds: [1.0, 0.2],
            eps_decay_fraction: 0.25,
            gamma: 0.9999,
            learning_epochs: 16,
            batch_size: 128,
            target_update_interval: 16,
            steps_per_epoch: 128,
            buffer_size: 2048,
            min_steps_learn: 2048,
            inner_activation: Activation::Relu,
            final_activation: Activation::Relu,
            optimizer: OptimizerKind::Adam,
            loss: LossFunction::Mse,
            dropout: 0.1,
            kernel_initializer: WeightInit::HeNormal,
            report_interval: 5,
            save_interval: 200,
            solved_threshold: 450.0,
            terminal_penalty: Some(-10.0),
            eval_episodes: 5,
            eval_max_steps: 500,
            reward_window: 100,
            max_collect_steps: 10_000,
            epochs: 10_000,
            seed: 42,
        }
    }
}

impl DqnConfig {
    pub fn validate(&self) -> Result<()> {
        check_hidden("hidden_dims", &self.hidden_dims)?;
        check_learning_rate("lr", self.lr)?;
        // builds the schedules to reuse their checks
        self.lr_schedule()?;
        self.epsilon_schedule()?;
        check_unit_interval("gamma", self.gamma)?;
        check_unit_interval("dropout", self.dropout)?;
        if self.dropout >= 1.0 {
            return Err(BalanceError::invalid_parameter("dropout", "must be below 1"));
        }

        for (name, value) in [
            ("learning_epochs", self.learning_epochs),
            ("batch_size", self.batch_size),
            ("target_update_interval", self.target_update_interval),
            ("steps_per_epoch", self.steps_per_epoch),
            ("buffer_size", self.buffer_size),
            ("report_interval", self.report_interval),
            ("save_interval", self.save_interval),
            ("eval_episodes", self.eval_episodes),
            ("eval_max_steps", self.eval_max_steps),
            ("reward_window", self.reward_window),
            ("max_collect_steps", self.max_collect_steps),
        ] {
            check_positive(name, value)?;
        }

        if self.batch_size > self.buffer_size {
            return Err(BalanceError::invalid_parameter(
                "batch_size",
                format!("{} exceeds buffer_size {}", self.batch_size, self.buffer_size),
            ));
        }
        if self.batch_size > self.min_steps_learn {
            return Err(BalanceError::invalid_parameter(
                "batch_size",
                format!("{} exceeds min_steps_learn {}", self.batch_size, self.min_steps_learn),
            ));
        }
        if self.max_collect_steps < self.steps_per_epoch || self.max_collect_steps < self.min_steps_learn {
            return Err(BalanceError::invalid_parameter(
                "max_collect_steps",
                "must cover steps_per_epoch and min_steps_learn",
            ));
        }
        Ok(())
    }

    pub fn epsilon_schedule(&self) -> Result<Schedule> {
        let [upper, lower] = self.epsilon_bounds;
        Schedule::epsilon(upper, lower, self.eps_decay_fraction, self.epochs)
    }

    pub fn lr_schedule(&self) -> Result<Schedule> {
        Schedule::learning_rate(self.lr, self.lr_decay, self.min_lr)
    }

    /// Q-network for `input_dim` observations and `action_count` actions
    pub fn build_q_network(&self, input_dim: usize, action_count: usize, seed: u64) -> Result<NeuralNetwork> {
        NetworkBuilder::new(input_dim, action_count)
            .hidden_layers(&self.hidden_dims)
            .hidden_activation(self.inner_activation)
            .output_activation(self.final_activation)
            .initializer(self.kernel_initializer)
            .optimizer(self.optimizer)
            .loss(self.loss)
            .learning_rate(self.lr)
            .dropout(self.dropout)
            .seed(seed)
            .build()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path.as_ref())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path.as_ref())
    }
}

/// Actor-critic training hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorCriticConfig {
    pub gamma: f32,
    pub policy_lr: f32,
    pub value_lr: f32,
    pub policy_hidden: Vec<usize>,
    pub value_hidden: Vec<usize>,
    pub hidden_activation: Activation,
    pub kernel_initializer: WeightInit,
    pub optimizer: OptimizerKind,
    pub max_episodes: usize,
    pub max_steps: usize,
    pub solved_threshold: f32,
    pub solved_window: usize,
    /// Trailing episodes whose mean freezes the actor once above the threshold
    pub stable_window: usize,
    pub save_interval: usize,
    pub seed: u64,
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        ActorCriticConfig {
            gamma: 0.99,
            policy_lr: 0.01,
            value_lr: 0.0007,
            policy_hidden: vec![12],
            value_hidden: vec![64, 16],
            hidden_activation: Activation::Relu,
            kernel_initializer: WeightInit::XavierNormal,
            optimizer: OptimizerKind::Adam,
            max_episodes: 5000,
            max_steps: 501,
            solved_threshold: 475.0,
            solved_window: 100,
            stable_window: 6,
            save_interval: 500,
            seed: 42,
        }
    }
}

impl ActorCriticConfig {
    pub fn validate(&self) -> Result<()> {
        check_unit_interval("gamma", self.gamma)?;
        check_learning_rate("policy_lr", self.policy_lr)?;
        check_learning_rate("value_lr", self.value_lr)?;
        check_hidden("policy_hidden", &self.policy_hidden)?;
        check_hidden("value_hidden", &self.value_hidden)?;
        check_positive("max_episodes", self.max_episodes)?;
        check_positive("max_steps", self.max_steps)?;
        check_positive("solved_window", self.solved_window)?;
        check_positive("stable_window", self.stable_window)?;
        check_positive("save_interval", self.save_interval)?;
        Ok(())
    }

    /// Actor: logits over `action_count` actions
    pub fn build_policy(&self, input_dim: usize, action_count: usize, seed: u64) -> Result<NeuralNetwork> {
        NetworkBuilder::new(input_dim, action_count)
            .hidden_layers(&self.policy_hidden)
            .hidden_activation(self.hidden_activation)
            .output_activation(Activation::Linear)
            .initializer(self.kernel_initializer)
            .optimizer(self.optimizer)
            .learning_rate(self.policy_lr)
            .seed(seed)
            .build()
    }

    /// Critic: one state value
    pub fn build_value(&self, input_dim: usize, seed: u64) -> Result<NeuralNetwork> {
        NetworkBuilder::new(input_dim, 1)
            .hidden_layers(&self.value_hidden)
            .hidden_activation(self.hidden_activation)
            .output_activation(Activation::Linear)
            .initializer(self.kernel_initializer)
            .optimizer(self.optimizer)
            .learning_rate(self.value_lr)
            .seed(seed)
            .build()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_json(path.as_ref())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_json(self, path.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        DqnConfig::default().validate().unwrap();
        ActorCriticConfig::default().validate().unwrap();
    }

    #[test]
    fn test_invalid_dqn_configs() {
        let mut config = DqnConfig::default();
        config.batch_size = 4096;
        assert!(config.validate().is_err());

        let mut config = DqnConfig::default();
        config.epsilon_bounds = [1.0, 1.5];
        assert!(config.validate().is_err());

        let mut config = DqnConfig::default();
        config.buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = DqnConfig::default();
        config.gamma = 1.5;
        assert!(config.validate().is_err());

        let mut config = DqnConfig::default();
        config.hidden_dims = vec![];
        assert!(config.validate().is_err());

        let mut config = DqnConfig::default();
        config.min_lr = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip_with_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(&path, r#"{ "double_dqn": true, "hidden_dims": [8, 8] }"#).unwrap();

        let config = DqnConfig::load(&path).unwrap();
        assert!(config.double_dqn);
        assert_eq!(config.hidden_dims, vec![8, 8]);
        assert_eq!(config.batch_size, 128);

        config.save(&path).unwrap();
        assert_eq!(DqnConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_networks_match_config() {
        use crate::estimator::Estimator;

        let config = ActorCriticConfig::default();
        let policy = config.build_policy(4, 2, 0).unwrap();
        let value = config.build_value(4, 0).unwrap();
        assert_eq!(policy.layers.len(), 2);
        assert_eq!(value.layers.len(), 3);
        assert_eq!(value.output_dim(), 1);
        assert_eq!(policy.learning_rate(), 0.01);
    }
}
