use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::index;
use std::collections::VecDeque;

use crate::error::{BalanceError, Result};

/// One recorded environment step
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

/// Sampled transitions as parallel arrays, rows in sample order.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionBatch {
    pub states: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_states: Array2<f32>,
    /// 1.0 for terminal rows, 0.0 otherwise
    pub dones: Array1<f32>,
}

impl TransitionBatch {
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Stack borrowed transitions into a batch.
    pub fn from_transitions(transitions: &[&Transition]) -> Result<Self> {
        let first = transitions
            .first()
            .ok_or_else(|| BalanceError::invalid_parameter("transitions", "cannot build an empty batch"))?;
        let state_dim = first.state.len();
        let batch_size = transitions.len();

        let mut states = Array2::zeros((batch_size, state_dim));
        let mut next_states = Array2::zeros((batch_size, state_dim));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Array1::zeros(batch_size);

        for (i, transition) in transitions.iter().enumerate() {
            if transition.state.len() != state_dim || transition.next_state.len() != state_dim {
                return Err(BalanceError::dimension_mismatch(
                    format!("state of length {}", state_dim),
                    format!("state of length {}", transition.state.len()),
                ));
            }
            states.row_mut(i).assign(&transition.state);
            next_states.row_mut(i).assign(&transition.next_state);
            actions.push(transition.action);
            rewards[i] = transition.reward;
            dones[i] = if transition.done { 1.0 } else { 0.0 };
        }

        Ok(TransitionBatch {
            states,
            actions,
            rewards,
            next_states,
            dones,
        })
    }
}

/// Bounded FIFO of transitions with uniform sampling.
///
/// Once `capacity` transitions are stored, each append evicts the oldest.
#[derive(Clone, Debug)]
pub struct ExperienceReplay {
    buffer: VecDeque<Transition>,
    capacity: usize,
}

impl ExperienceReplay {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(BalanceError::invalid_parameter("capacity", "replay buffer capacity must be positive"));
        }
        Ok(ExperienceReplay {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn append(&mut self, transition: Transition) {
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    pub fn sample(&self, batch_size: usize, rng: &mut StdRng) -> Result<TransitionBatch> {
        if batch_size == 0 {
            return Err(BalanceError::invalid_parameter("batch_size", "must be positive"));
        }
        if batch_size > self.buffer.len() {
            return Err(BalanceError::InsufficientSamples {
                requested: batch_size,
                available: self.buffer.len(),
            });
        }

        let picked: Vec<&Transition> = index::sample(rng, self.buffer.len(), batch_size)
            .into_iter()
            .map(|i| &self.buffer[i])
            .collect();
        TransitionBatch::from_transitions(&picked)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
