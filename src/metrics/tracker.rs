use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::Result;

/// One finished actor-critic episode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub episode: usize,
    pub reward: f32,
    /// Trailing-window mean reward, 0 until the window fills
    pub rolling_mean: f32,
    /// Actor loss at the episode's final step
    pub loss: f32,
}

/// One DQN report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub loss: f32,
    pub avg_reward: f32,
    pub avg_length: f32,
    pub running_avg_reward: f32,
    pub epsilon: f32,
    pub learning_rate: f32,
}

/// Training history kept for export and plotting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingCurves {
    pub episodes: Vec<EpisodeRecord>,
    pub epochs: Vec<EpochRecord>,
}

impl TrainingCurves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_episode(&mut self, record: EpisodeRecord) {
        self.episodes.push(record);
    }

    pub fn record_epoch(&mut self, record: EpochRecord) {
        self.epochs.push(record);
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty() && self.epochs.is_empty()
    }

    /// Save the curves as pretty JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
