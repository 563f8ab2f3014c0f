// DQN training on CartPole
// Writes params.json, scalars.csv, checkpoints and curves into a timestamped run directory

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use balance::activations::Activation;
use balance::config::DqnConfig;
use balance::context::TrainingContext;
use balance::env::CartPole;
use balance::layers::WeightInit;
use balance::loss::LossFunction;
use balance::optimizer::OptimizerKind;
use balance::report::{CheckpointManager, CsvScalarLog, Reporter, RunDirectory};
use balance::trainer::DqnTrainer;
use balance::visualization::{export_curves_csv, export_curves_json, progress_report};

#[derive(Parser)]
#[command(name = "dqn")]
#[command(about = "Train a DQN agent on CartPole", version)]
struct Cli {
    /// Start from this JSON config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use double-DQN targets [default: off]
    #[arg(long)]
    double_dqn: bool,

    /// Hidden layer widths [default: 16,32,32,16,16]
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    hidden_dims: Option<Vec<usize>>,

    /// Initial learning rate [default: 0.01]
    #[arg(long)]
    lr: Option<f32>,

    /// Learning-rate floor [default: 0.001]
    #[arg(long)]
    min_lr: Option<f32>,

    /// Per-epoch learning-rate decay [default: 0.999]
    #[arg(long)]
    lr_decay: Option<f32>,

    /// Upper and lower epsilon [default: 1.0 0.2]
    #[arg(long, num_args = 2)]
    epsilon_bounds: Option<Vec<f32>>,

    /// Fraction of the epochs spent decaying epsilon [default: 0.25]
    #[arg(long)]
    eps_decay_fraction: Option<f32>,

    /// Discount factor [default: 0.9999]
    #[arg(long)]
    gamma: Option<f32>,

    /// Minibatch updates per epoch [default: 16]
    #[arg(long)]
    learning_epochs: Option<usize>,

    /// Minibatch size [default: 128]
    #[arg(long)]
    batch_size: Option<usize>,

    /// Epochs between target network syncs [default: 16]
    #[arg(long)]
    target_update_interval: Option<usize>,

    /// Environment steps collected per epoch [default: 128]
    #[arg(long)]
    steps_per_epoch: Option<usize>,

    /// Replay buffer capacity [default: 2048]
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Random warm-up steps before training [default: 2048]
    #[arg(long)]
    min_steps_learn: Option<usize>,

    /// Hidden layer activation [default: relu]
    #[arg(long)]
    inner_activation: Option<Activation>,

    /// Output layer activation [default: relu]
    #[arg(long)]
    final_activation: Option<Activation>,

    /// adam, rmsprop or sgd [default: adam]
    #[arg(long)]
    optimizer: Option<OptimizerKind>,

    /// mse or huber [default: mse]
    #[arg(long)]
    loss: Option<LossFunction>,

    /// Dropout rate after hidden layers [default: 0.1]
    #[arg(long)]
    dropout: Option<f32>,

    /// Weight initializer [default: he_normal]
    #[arg(long)]
    kernel_initializer: Option<WeightInit>,

    /// Epochs between evaluations [default: 5]
    #[arg(long)]
    report_interval: Option<usize>,

    /// Epochs between checkpoints [default: 200]
    #[arg(long)]
    save_interval: Option<usize>,

    /// Running evaluation reward that ends training [default: 450]
    #[arg(long)]
    solved_threshold: Option<f32>,

    /// Reward stored for failing terminal steps [default: -10]
    #[arg(long, allow_hyphen_values = true)]
    terminal_penalty: Option<f32>,

    /// Keep the environment's reward on failing terminal steps
    #[arg(long, conflicts_with = "terminal_penalty")]
    no_terminal_penalty: bool,

    /// Greedy episodes per evaluation [default: 5]
    #[arg(long)]
    eval_episodes: Option<usize>,

    /// Step limit of an evaluation episode [default: 500]
    #[arg(long)]
    eval_max_steps: Option<usize>,

    /// Evaluation rewards averaged by the stopping check [default: 100]
    #[arg(long)]
    reward_window: Option<usize>,

    /// Step cap for one collection call [default: 10000]
    #[arg(long)]
    max_collect_steps: Option<usize>,

    /// Training epochs [default: 10000]
    #[arg(long)]
    epochs: Option<usize>,

    /// Random seed [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Root directory for run logs
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Cli {
    fn resolve(&self) -> Result<DqnConfig> {
        let mut config = match &self.config {
            Some(path) => DqnConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
            None => DqnConfig::default(),
        };

        if self.double_dqn {
            config.double_dqn = true;
        }
        if let Some(dims) = &self.hidden_dims {
            config.hidden_dims = dims.clone();
        }
        if let Some(bounds) = &self.epsilon_bounds {
            config.epsilon_bounds = [bounds[0], bounds[1]];
        }
        if self.no_terminal_penalty {
            config.terminal_penalty = None;
        } else if let Some(penalty) = self.terminal_penalty {
            config.terminal_penalty = Some(penalty);
        }

        macro_rules! override_fields {
            ($($field:ident),*) => {
                $(if let Some(value) = self.$field { config.$field = value; })*
            };
        }
        override_fields!(
            lr,
            min_lr,
            lr_decay,
            eps_decay_fraction,
            gamma,
            learning_epochs,
            batch_size,
            target_update_interval,
            steps_per_epoch,
            buffer_size,
            min_steps_learn,
            inner_activation,
            final_activation,
            optimizer,
            loss,
            dropout,
            kernel_initializer,
            report_interval,
            save_interval,
            solved_threshold,
            eval_episodes,
            eval_max_steps,
            reward_window,
            max_collect_steps,
            epochs,
            seed
        );

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.resolve()?;

    let run = RunDirectory::create(&cli.log_dir).context("creating run directory")?;
    config.save(run.params_path())?;
    info!("Logging to {}", run.path().display());

    let mut scalars = CsvScalarLog::create(run.scalars_path())?;
    let mut checkpoints = CheckpointManager::new(run.checkpoint_dir(), CheckpointManager::DEFAULT_MAX_TO_KEEP)?;
    let mut reporter = Reporter::new(&mut scalars, &mut checkpoints);

    let epochs = config.epochs;
    let context = TrainingContext::new(config.seed);
    let mut trainer = DqnTrainer::from_config(config, CartPole::new(), context)?;
    let outcome = trainer.train(epochs, &mut reporter)?;

    export_curves_csv(&outcome.curves, run.curves_csv_path())?;
    export_curves_json(&outcome.curves, run.curves_json_path())?;
    fs::write(run.progress_path(), progress_report(&outcome.curves))?;

    info!(
        "Finished after {} epochs (solved: {}, running avg reward: {:.1})",
        outcome.epochs_run,
        outcome.solved,
        outcome.running_avg_reward.unwrap_or(0.0)
    );
    Ok(())
}
