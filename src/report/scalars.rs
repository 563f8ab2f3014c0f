use chrono::Utc;
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::MetricsSink;
use crate::error::Result;

/// Scalar log in CSV form, one `step,tag,value,wall_time` row per value.
///
/// `wall_time` is seconds since the Unix epoch.
pub struct CsvScalarLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl CsvScalarLog {
    /// Create (or truncate) the log file and write the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "step,tag,value,wall_time")?;
        Ok(CsvScalarLog { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn wall_time() -> f64 {
        Utc::now().timestamp_millis() as f64 / 1000.0
    }
}

impl MetricsSink for CsvScalarLog {
    fn scalar(&mut self, tag: &str, step: usize, value: f32) -> Result<()> {
        writeln!(self.writer, "{},{},{},{:.3}", step, tag, value, Self::wall_time())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scalars_written_as_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train").join("scalars.csv");
        let mut log = CsvScalarLog::create(&path).unwrap();
        log.scalar("loss", 0, 1.5).unwrap();
        log.scalar("epsilon", 5, 0.25).unwrap();
        log.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "step,tag,value,wall_time");
        assert!(lines[1].starts_with("0,loss,1.5,"));
        assert!(lines[2].starts_with("5,epsilon,0.25,"));
    }
}
