//! # Balance - Actor-Critic and DQN Training for Discrete Control
//!
//! Balance trains agents on small discrete-action control tasks such as
//! CartPole. It ships two training programs and the pieces they are made of.
//!
//! ## Key Features
//!
//! - **Estimators**: a small dense network behind the [`estimator::Estimator`] trait
//! - **DQN**: experience replay, epsilon-greedy exploration, target network, double DQN
//! - **Actor-Critic**: one-step TD updates with a per-episode discount accumulator
//! - **Schedules**: linear epsilon decay and floored exponential learning-rate decay
//! - **Reporting**: CSV scalar logs, bincode checkpoints with retention, ASCII plots
//! - **Reproducibility**: every random draw comes from a seeded [`context::TrainingContext`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use balance::config::DqnConfig;
//! use balance::context::TrainingContext;
//! use balance::env::CartPole;
//! use balance::report::{NullSink, Reporter};
//! use balance::trainer::DqnTrainer;
//!
//! let config = DqnConfig::default();
//! let context = TrainingContext::new(config.seed);
//! let mut trainer = DqnTrainer::from_config(config, CartPole::new(), context).unwrap();
//!
//! let (mut scalars, mut checkpoints) = (NullSink, NullSink);
//! let mut reporter = Reporter::new(&mut scalars, &mut checkpoints);
//! let outcome = trainer.train(1000, &mut reporter).unwrap();
//! println!("solved: {}", outcome.solved);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions (ReLU, Sigmoid, Tanh, etc.)
//! - [`agent`] - DQN and actor-critic agents, action selection
//! - [`builders`] - Builder for multilayer perceptrons
//! - [`config`] - Hyperparameters, validation and JSON persistence
//! - [`context`] - Seeded random source for a run
//! - [`env`] - Environment trait, CartPole and test stubs
//! - [`error`] - Error types and result handling
//! - [`estimator`] - The estimator capability trait
//! - [`layers`] - Dense layers, dropout and weight initialization
//! - [`loss`] - Regression losses
//! - [`metrics`] - Rolling windows and training curves
//! - [`network`] - Neural network implementing the estimator trait
//! - [`optimizer`] - SGD, Adam and RMSProp
//! - [`replay_buffer`] - Experience replay for DQN
//! - [`report`] - Scalar and checkpoint sinks, run directories
//! - [`schedule`] - Epsilon and learning-rate schedules
//! - [`trainer`] - DQN and actor-critic training loops
//! - [`visualization`] - Curve export and text plots

pub mod activations;
pub mod agent;
pub mod builders;
pub mod config;
pub mod context;
pub mod env;
pub mod error;
pub mod estimator;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod report;
pub mod schedule;
pub mod trainer;
pub mod visualization;

pub use error::{BalanceError, Result};

#[cfg(test)]
mod tests;
