use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use volley::{Configuration, Engine};

/// Environment variable overriding the log filter, e.g. `debug` or `volley=trace`.
const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_tracing() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Configuration::from_file(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    info!(
        url = %config.url,
        workers = config.workers.get(),
        iterations_per_worker = config.iterations_per_worker.get(),
        num_clients = config.client_pool.num_clients.get(),
        transport = %config.client_pool.transport_mode(),
        sample_capacity = config.sample_capacity.get(),
        "Begin"
    );

    let engine = Engine::from_config(config).context("Failed to set up client pool")?;
    let report = engine.run().await.context("Load test run failed")?;

    info!(
        latency = %report.latency,
        status_counts = %report.status_counts,
        "End"
    );

    Ok(())
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = match std::env::var(LOG_LEVEL_ENV) {
        Ok(directives) => EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid {LOG_LEVEL_ENV} value {directives:?}"))?,
        Err(_) => EnvFilter::new(DEFAULT_LOG_LEVEL),
    };

    FmtSubscriber::builder().with_env_filter(filter).init();
    info!("Log filter configured");

    Ok(())
}
