// One-step actor-critic training on CartPole

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use balance::config::ActorCriticConfig;
use balance::context::TrainingContext;
use balance::env::CartPole;
use balance::report::{CheckpointManager, CsvScalarLog, Reporter, RunDirectory};
use balance::trainer::ActorCriticTrainer;
use balance::visualization::{export_curves_csv, export_curves_json, progress_report};

#[derive(Parser)]
#[command(name = "actor-critic")]
#[command(about = "Train a one-step actor-critic agent on CartPole", version)]
struct Cli {
    /// Start from this JSON config; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Discount factor [default: 0.99]
    #[arg(long)]
    gamma: Option<f32>,

    /// Actor learning rate [default: 0.01]
    #[arg(long)]
    policy_lr: Option<f32>,

    /// Critic learning rate [default: 0.0007]
    #[arg(long)]
    value_lr: Option<f32>,

    /// Episode limit [default: 5000]
    #[arg(long)]
    max_episodes: Option<usize>,

    /// Step limit per episode [default: 501]
    #[arg(long)]
    max_steps: Option<usize>,

    /// Random seed [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the episode, rewards, mean rewards and losses
    #[arg(long, default_value = "optimal_actor_critic.json")]
    output: PathBuf,

    /// Root directory for run logs
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

impl Cli {
    fn resolve(&self) -> Result<ActorCriticConfig> {
        let mut config = match &self.config {
            Some(path) => ActorCriticConfig::load(path).with_context(|| format!("reading {}", path.display()))?,
            None => ActorCriticConfig::default(),
        };
        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(lr) = self.policy_lr {
            config.policy_lr = lr;
        }
        if let Some(lr) = self.value_lr {
            config.value_lr = lr;
        }
        if let Some(episodes) = self.max_episodes {
            config.max_episodes = episodes;
        }
        if let Some(steps) = self.max_steps {
            config.max_steps = steps;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
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

    let context = TrainingContext::new(config.seed);
    let mut trainer = ActorCriticTrainer::from_config(config, CartPole::new(), context)?;
    let outcome = trainer.train(&mut reporter)?;

    let json = serde_json::to_string_pretty(&outcome)?;
    fs::write(&cli.output, json).with_context(|| format!("writing {}", cli.output.display()))?;

    let curves = outcome.curves();
    export_curves_csv(&curves, run.curves_csv_path())?;
    export_curves_json(&curves, run.curves_json_path())?;
    fs::write(run.progress_path(), progress_report(&curves))?;

    info!(
        "Stopped at episode {} (solved: {})",
        outcome.last_episode, outcome.solved
    );
    Ok(())
}
