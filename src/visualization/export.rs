use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::metrics::TrainingCurves;

/// Export actor-critic episode rows to CSV
pub fn export_episodes_csv<P: AsRef<Path>>(curves: &TrainingCurves, path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "episode,reward,rolling_mean,loss")?;
    for record in &curves.episodes {
        writeln!(
            file,
            "{},{},{},{}",
            record.episode, record.reward, record.rolling_mean, record.loss
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Export DQN report rows to CSV
pub fn export_epochs_csv<P: AsRef<Path>>(curves: &TrainingCurves, path: P) -> Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "epoch,loss,avg_reward,avg_length,running_avg_reward,epsilon,learning_rate")?;
    for record in &curves.epochs {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            record.epoch,
            record.loss,
            record.avg_reward,
            record.avg_length,
            record.running_avg_reward,
            record.epsilon,
            record.learning_rate
        )?;
    }
    file.flush()?;
    Ok(())
}

/// Export whichever curve the run produced; epoch rows win when both exist.
pub fn export_curves_csv<P: AsRef<Path>>(curves: &TrainingCurves, path: P) -> Result<()> {
    if curves.epochs.is_empty() {
        export_episodes_csv(curves, path)
    } else {
        export_epochs_csv(curves, path)
    }
}

pub fn export_curves_json<P: AsRef<Path>>(curves: &TrainingCurves, path: P) -> Result<()> {
    curves.save_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::EpochRecord;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_epoch_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("curves.csv");
        let mut curves = TrainingCurves::new();
        curves.record_epoch(EpochRecord {
            epoch: 5,
            loss: 0.5,
            avg_reward: 20.0,
            avg_length: 20.0,
            running_avg_reward: 18.0,
            epsilon: 0.9,
            learning_rate: 0.01,
        });

        export_curves_csv(&curves, &path).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("epoch,loss"));
        assert_eq!(lines[1], "5,0.5,20,20,18,0.9,0.01");

        let json_path = dir.path().join("curves.json");
        export_curves_json(&curves, &json_path).unwrap();
        let loaded = TrainingCurves::load_json(&json_path).unwrap();
        assert_eq!(loaded.epochs, curves.epochs);
    }
}
