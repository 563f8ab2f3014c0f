pub mod tracker;
pub mod window;

pub use tracker::{EpisodeRecord, EpochRecord, TrainingCurves};
pub use window::RollingWindow;
