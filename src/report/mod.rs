//! Side-effect sinks for training runs.
//!
//! Trainers never write files themselves. Scalars go to a [`MetricsSink`] and
//! parameter snapshots to a [`CheckpointSink`]; both are injected through a
//! [`Reporter`]. [`MemorySink`] and [`NullSink`] make runs observable or silent
//! in tests.

pub mod checkpoint;
pub mod run_dir;
pub mod scalars;

pub use checkpoint::CheckpointManager;
pub use run_dir::RunDirectory;
pub use scalars::CsvScalarLog;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::estimator::Parameters;

/// Snapshot of estimator parameters at some training step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub step: usize,
    pub label: String,
    /// Named parameter sets, e.g. `("q_network", ..)`
    pub estimators: Vec<(String, Parameters)>,
}

impl Checkpoint {
    pub fn new<S: Into<String>>(step: usize, label: S) -> Self {
        Checkpoint {
            step,
            label: label.into(),
            estimators: Vec::new(),
        }
    }

    pub fn with_estimator<S: Into<String>>(mut self, name: S, parameters: Parameters) -> Self {
        self.estimators.push((name.into(), parameters));
        self
    }

    pub fn estimator(&self, name: &str) -> Option<&Parameters> {
        self.estimators
            .iter()
            .find(|(estimator_name, _)| estimator_name == name)
            .map(|(_, parameters)| parameters)
    }
}

/// Receives scalar time series
pub trait MetricsSink {
    fn scalar(&mut self, tag: &str, step: usize, value: f32) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Persists checkpoints
pub trait CheckpointSink {
    /// Store `checkpoint` and return where it went
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf>;
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn scalar(&mut self, _tag: &str, _step: usize, _value: f32) -> Result<()> {
        Ok(())
    }
}

impl CheckpointSink for NullSink {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        Ok(PathBuf::from(format!("ckpt-{}", checkpoint.step)))
    }
}

/// Keeps everything in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub scalars: Vec<(String, usize, f32)>,
    pub checkpoints: Vec<Checkpoint>,
    pub flushes: usize,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `(step, value)` pairs logged under `tag`
    pub fn series(&self, tag: &str) -> Vec<(usize, f32)> {
        self.scalars
            .iter()
            .filter(|(t, _, _)| t == tag)
            .map(|&(_, step, value)| (step, value))
            .collect()
    }
}

impl MetricsSink for MemorySink {
    fn scalar(&mut self, tag: &str, step: usize, value: f32) -> Result<()> {
        self.scalars.push((tag.to_string(), step, value));
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

impl CheckpointSink for MemorySink {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        self.checkpoints.push(checkpoint.clone());
        Ok(PathBuf::from(format!("ckpt-{}", checkpoint.step)))
    }
}

/// Pair of sinks handed to a trainer
pub struct Reporter<'a> {
    pub metrics: &'a mut dyn MetricsSink,
    pub checkpoints: &'a mut dyn CheckpointSink,
}

impl<'a> Reporter<'a> {
    pub fn new(metrics: &'a mut dyn MetricsSink, checkpoints: &'a mut dyn CheckpointSink) -> Self {
        Reporter { metrics, checkpoints }
    }

    pub fn scalar(&mut self, tag: &str, step: usize, value: f32) -> Result<()> {
        self.metrics.scalar(tag, step, value)
    }

    pub fn scalars(&mut self, step: usize, values: &[(&str, f32)]) -> Result<()> {
        for &(tag, value) in values {
            self.metrics.scalar(tag, step, value)?;
        }
        Ok(())
    }

    pub fn checkpoint(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        self.checkpoints.save(checkpoint)
    }

    pub fn flush(&mut self) -> Result<()> {
        self.metrics.flush()
    }
}
