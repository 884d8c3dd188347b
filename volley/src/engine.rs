use crate::client::{HttpClient, ReqwestClient};
use crate::error::EngineError;
use crate::pool::ClientPool;
use crate::sampler::LatencySampler;
use crate::worker::{run_worker, WorkerResult};
use humantime::format_duration;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};
use volley_core::{AggregateReport, Configuration, StatusCounts};

/// Drives a full run: spawns one task per worker, waits for every one of them, then merges
/// their results into a single [`AggregateReport`].
///
/// # Example
/// ```no_run
/// use volley::{Configuration, Engine};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Configuration::from_file("volley.toml")?;
///     let report = Engine::from_config(config)?.run().await?;
///     println!("{report}");
///     Ok(())
/// }
/// ```
pub struct Engine<C> {
    config: Arc<Configuration>,
    pool: Arc<ClientPool<C>>,
}

impl Engine<ReqwestClient> {
    /// Build an engine with a pool of `reqwest` clients as described by the configuration.
    pub fn from_config(config: Configuration) -> Result<Self, EngineError> {
        let pool = ClientPool::<ReqwestClient>::build(
            config.client_pool.num_clients.get(),
            config.client_pool.transport_mode(),
            config.request_timeout,
        )?;
        Ok(Self::new(config, pool))
    }
}

impl<C: HttpClient> Engine<C> {
    pub fn new(config: Configuration, pool: ClientPool<C>) -> Self {
        Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
        }
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Run every worker to completion and return the merged report.
    ///
    /// Either all workers finish and a report is produced, or the first worker task failure is
    /// returned and the remaining workers are aborted.
    #[instrument(name = "engine", skip_all, fields(workers = self.config.workers.get(), iterations = self.config.iterations_per_worker.get()))]
    pub async fn run(&self) -> Result<AggregateReport, EngineError> {
        info!("Starting run against {}", self.config.url);

        let sampler = Arc::new(LatencySampler::new(self.config.sample_capacity));
        let start = Instant::now();

        let mut workers = JoinSet::new();
        for worker in 0..self.config.workers.get() {
            workers.spawn(
                run_worker(
                    worker,
                    self.config.clone(),
                    self.pool.clone(),
                    sampler.clone(),
                )
                .in_current_span(),
            );
        }

        let mut results = Vec::with_capacity(self.config.workers.get());
        while let Some(res) = workers.join_next().await {
            results.push(res?);
        }

        let wall_time = start.elapsed();
        sampler.set_wall_time(wall_time);

        let status_counts = merge_results(results);
        let latency = sampler.finalize();

        info!(
            "Run complete in {}: {} calls",
            format_duration(wall_time),
            status_counts.total()
        );

        Ok(AggregateReport {
            latency,
            status_counts,
        })
    }
}

/// Sum the per-worker status counts. Independent of the order results arrive in.
pub fn merge_results<I>(results: I) -> StatusCounts
where
    I: IntoIterator<Item = WorkerResult>,
{
    results
        .into_iter()
        .fold(StatusCounts::new(), |mut merged, result| {
            merged.merge(result.status_counts);
            merged
        })
}
