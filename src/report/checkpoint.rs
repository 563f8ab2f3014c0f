use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Checkpoint, CheckpointSink};
use crate::error::{BalanceError, Result};

/// Writes checkpoints as `ckpt-<step>.bin` (bincode) into one directory and
/// keeps only the newest `max_to_keep` of the files it wrote.
pub struct CheckpointManager {
    directory: PathBuf,
    max_to_keep: usize,
    kept: VecDeque<PathBuf>,
}

impl CheckpointManager {
    pub const DEFAULT_MAX_TO_KEEP: usize = 3;

    pub fn new<P: AsRef<Path>>(directory: P, max_to_keep: usize) -> Result<Self> {
        if max_to_keep == 0 {
            return Err(BalanceError::invalid_parameter("max_to_keep", "must keep at least one checkpoint"));
        }
        let directory = directory.as_ref().to_path_buf();
        fs::create_dir_all(&directory)?;
        Ok(CheckpointManager {
            directory,
            max_to_keep,
            kept: VecDeque::new(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, step: usize) -> PathBuf {
        self.directory.join(format!("ckpt-{}.bin", step))
    }

    /// Checkpoint files in the directory, ordered by step
    pub fn list(&self) -> Result<Vec<(usize, PathBuf)>> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            let step = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_prefix("ckpt-"))
                .and_then(|name| name.strip_suffix(".bin"))
                .and_then(|step| step.parse::<usize>().ok());
            if let Some(step) = step {
                found.push((step, path));
            }
        }
        found.sort_by_key(|(step, _)| *step);
        Ok(found)
    }

    /// Path of the checkpoint with the highest step, if any
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        Ok(self.list()?.pop().map(|(_, path)| path))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Checkpoint> {
        let data = fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }
}

impl CheckpointSink for CheckpointManager {
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf> {
        let path = self.path_for(checkpoint.step);
        let serialized = bincode::serialize(checkpoint)?;
        fs::write(&path, serialized)?;

        self.kept.retain(|kept| kept != &path);
        self.kept.push_back(path.clone());
        while self.kept.len() > self.max_to_keep {
            if let Some(oldest) = self.kept.pop_front() {
                debug!(path = %oldest.display(), "removing old checkpoint");
                fs::remove_file(&oldest)?;
            }
        }
        Ok(path)
    }
}
