pub mod export;
pub mod text_plots;

pub use export::{export_curves_csv, export_curves_json, export_episodes_csv, export_epochs_csv};
pub use text_plots::{plot_series, progress_report};
