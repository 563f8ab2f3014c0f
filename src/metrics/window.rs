use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fixed-size window over the most recent values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollingWindow {
    values: VecDeque<f32>,
    size: usize,
}

impl RollingWindow {
    /// A window of at least one value
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        RollingWindow {
            values: VecDeque::with_capacity(size),
            size,
        }
    }

    pub fn push(&mut self, value: f32) {
        if self.values.len() >= self.size {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn extend<I: IntoIterator<Item = f32>>(&mut self, values: I) {
        for value in values {
            self.push(value);
        }
    }

    /// Mean of the stored values, `None` when empty
    pub fn mean(&self) -> Option<f32> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f32>() / self.values.len() as f32)
        }
    }

    /// Mean only once the window has filled up
    pub fn full_mean(&self) -> Option<f32> {
        if self.is_full() {
            self.mean()
        } else {
            None
        }
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.size
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
