use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Layout of one training run: `<root>/<YYYYmmdd-HHMMSS>/train/`.
#[derive(Debug, Clone)]
pub struct RunDirectory {
    path: PathBuf,
}

impl RunDirectory {
    /// Create a fresh timestamped run directory under `root`.
    pub fn create<P: AsRef<Path>>(root: P) -> Result<Self> {
        let stamp = Local::now().format("%Y%m%d-%H%M%S").to_string();
        Self::at(root.as_ref().join(stamp).join("train"))
    }

    /// Use `path` as the run directory, creating it if needed.
    pub fn at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        Ok(RunDirectory { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn params_path(&self) -> PathBuf {
        self.path.join("params.json")
    }

    pub fn scalars_path(&self) -> PathBuf {
        self.path.join("scalars.csv")
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.path.join("tf_ckpts")
    }

    pub fn curves_csv_path(&self) -> PathBuf {
        self.path.join("curves.csv")
    }

    pub fn curves_json_path(&self) -> PathBuf {
        self.path.join("curves.json")
    }

    pub fn progress_path(&self) -> PathBuf {
        self.path.join("progress.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_timestamped_layout() {
        let root = TempDir::new().unwrap();
        let run = RunDirectory::create(root.path()).unwrap();

        assert!(run.path().is_dir());
        assert_eq!(run.path().file_name().unwrap(), "train");
        let stamp = run.path().parent().unwrap().file_name().unwrap().to_str().unwrap();
        assert_eq!(stamp.len(), "20240101-120000".len());
        assert_eq!(run.params_path(), run.path().join("params.json"));
    }
}
