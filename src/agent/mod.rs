//! # Reinforcement Learning Agents Module
//!
//! Agents own their estimators and know how to pick actions and how to turn
//! observed transitions into parameter updates. They never touch an
//! environment; the trainers in [`crate::trainer`] drive the interaction.
//!
//! ## Available Agents
//!
//! - **DqnAgent**: Q-network with a periodically synced target network
//!   - Optional double-DQN targets (online network selects, target evaluates)
//!   - Epsilon-greedy exploration
//!   - Batch updates from [`ExperienceReplay`](crate::replay_buffer::ExperienceReplay)
//! - **ActorCriticAgent**: one-step TD actor-critic
//!   - Softmax policy over actor logits
//!   - Critic and actor updates scaled by a per-episode discount accumulator
//!
//! ## Example Usage
//!
//! ```rust
//! use balance::agent::DqnAgent;
//! use balance::builders::NetworkBuilder;
//! use ndarray::array;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let q_network = NetworkBuilder::new(4, 2)
//!     .hidden_layers(&[16, 16])
//!     .seed(1)
//!     .build()
//!     .unwrap();
//! let agent = DqnAgent::new(q_network, 0.99, true).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let state = array![0.1, 0.2, -0.3, 0.4];
//! let action = agent.act(state.view(), 0.1, &mut rng).unwrap();
//! assert!(action < 2);
//! ```

pub mod actor_critic;
pub mod dqn;
pub mod policy;

pub use actor_critic::{ActorCriticAgent, DiscountAccumulator, StepLosses, TdStep};
pub use dqn::DqnAgent;
