use crate::metrics::TrainingCurves;

/// Plot a series as ASCII art
pub fn plot_series(values: &[f32], title: &str, width: usize, height: usize) -> String {
    let values: Vec<f32> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if values.is_empty() || width < 10 || height < 5 {
        return format!("{}: Invalid data or dimensions\n", title);
    }

    let min_val = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if (max_val - min_val).abs() < f32::EPSILON {
        return format!("{}: All values are {:.4}\n", title, min_val);
    }

    let mut plot = vec![vec![' '; width]; height];

    for row in plot.iter_mut() {
        row[0] = '|';
    }
    for cell in plot[height - 1].iter_mut() {
        *cell = '-';
    }
    plot[height - 1][0] = '+';

    let columns = (width - 3) as f32;
    let last_index = (values.len() - 1).max(1) as f32;
    let y_scale = (height - 3) as f32 / (max_val - min_val);

    for (i, &value) in values.iter().enumerate() {
        let x = ((i as f32 / last_index * columns) as usize + 2).min(width - 1);
        let lift = ((value - min_val) * y_scale) as usize;
        let y = (height - 3).saturating_sub(lift).min(height - 2);
        plot[y][x] = '*';
    }

    let mut output = format!("{}\n", title);
    output.push_str(&format!("Max: {:.4}\n", max_val));

    for row in plot.iter() {
        output.push_str(&row.iter().collect::<String>());
        output.push('\n');
    }

    output.push_str(&format!("Min: {:.4}\n", min_val));
    output.push_str(&format!("Points: {}\n", values.len()));

    output
}

/// Reward, loss and epsilon plots for a finished run
pub fn progress_report(curves: &TrainingCurves) -> String {
    let mut output = String::new();

    if !curves.episodes.is_empty() {
        let rewards: Vec<f32> = curves.episodes.iter().map(|r| r.reward).collect();
        let means: Vec<f32> = curves.episodes.iter().map(|r| r.rolling_mean).collect();
        let losses: Vec<f32> = curves.episodes.iter().map(|r| r.loss).collect();
        output.push_str(&plot_series(&rewards, "Episode Reward", 60, 15));
        output.push('\n');
        output.push_str(&plot_series(&means, "Mean Reward (trailing window)", 60, 15));
        output.push('\n');
        output.push_str(&plot_series(&losses, "Actor Loss", 60, 15));
    }

    if !curves.epochs.is_empty() {
        let rewards: Vec<f32> = curves.epochs.iter().map(|r| r.running_avg_reward).collect();
        let losses: Vec<f32> = curves.epochs.iter().map(|r| r.loss).collect();
        let epsilons: Vec<f32> = curves.epochs.iter().map(|r| r.epsilon).collect();
        output.push_str(&plot_series(&rewards, "Running Average Reward", 60, 15));
        output.push('\n');
        output.push_str(&plot_series(&losses, "Loss", 60, 15));
        output.push('\n');
        output.push_str(&plot_series(&epsilons, "Epsilon", 60, 15));
    }

    if output.is_empty() {
        output.push_str("No training data recorded\n");
    }
    output
}
