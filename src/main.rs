use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use u_schedsim::runner::{load_trained_config, run_benchmarks, train_swarm};
use u_schedsim::settings::AppConfig;

const DEFAULT_CONFIG: &str = "config.yml";

#[derive(Parser)]
#[command(
    name = "u-schedsim",
    about = "Multi-server scheduling simulator with particle-swarm policy tuning",
    version,
    propagate_version = true
)]
struct Cli {
    /// YAML configuration file (default: ./config.yml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Results directory
    #[arg(short, long, global = true, default_value = "results")]
    output: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search scheduler parameters with the particle swarm
    TrainSwarm,
    /// Run the six benchmark variants
    RunBenchmarks {
        /// swarm_best_config.csv to use for the swarm_param variant
        #[arg(short, long)]
        trained: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => {
            AppConfig::load(DEFAULT_CONFIG).context("loading ./config.yml")
        }
        None => Ok(AppConfig::default()),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("u_schedsim=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::TrainSwarm => {
            let outcome = train_swarm(&config, &cli.output).context("swarm training failed")?;
            match outcome.best {
                Some((best, cost)) => info!(
                    cost,
                    reconfig_min_gain = best.reconfig_min_gain,
                    reconfig_max_share = best.reconfig_max_share,
                    power_off_idle = best.power_off_idle,
                    dir = %outcome.output_dir.display(),
                    "training finished"
                ),
                None => info!("training stopped before the first epoch"),
            }
        }
        Commands::RunBenchmarks { trained } => {
            let trained = trained
                .as_deref()
                .map(load_trained_config)
                .transpose()
                .context("loading trained configuration")?;
            run_benchmarks(&config, &cli.output, trained).context("benchmarks failed")?;
        }
    }
    Ok(())
}
