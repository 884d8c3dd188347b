use crate::client::HttpClient;
use crate::pool::ClientPool;
use crate::sampler::LatencySampler;
use std::sync::Arc;
use std::time::{Duration, Instant};
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};
use volley_core::{Configuration, StatusCounts, FAILED_CALL_STATUS};

/// What a single worker hands back to the engine once it has finished all of its iterations.
#[derive(Clone, Debug)]
pub struct WorkerResult {
    pub worker: usize,
    pub client_index: usize,
    pub status_counts: StatusCounts,
    pub elapsed: Duration,
}

impl WorkerResult {
    /// Calls per second achieved by this worker alone.
    pub fn throughput(&self) -> f64 {
        if self.elapsed.is_zero() {
            0.
        } else {
            self.status_counts.total() as f64 / self.elapsed.as_secs_f64()
        }
    }
}

/// Issue `iterations_per_worker` sequential GETs using one client from the pool.
///
/// A failed call is counted under status `0` and the loop moves on; nothing here is retried and
/// no call failure ends the worker early.
#[instrument(name = "worker", skip_all, fields(worker = worker))]
pub(crate) async fn run_worker<C: HttpClient>(
    worker: usize,
    config: Arc<Configuration>,
    pool: Arc<ClientPool<C>>,
    sampler: Arc<LatencySampler>,
) -> WorkerResult {
    let (client, client_index) = pool.acquire();
    info!(client_index, "Begin worker");

    let start = Instant::now();
    let mut status_counts = StatusCounts::new();

    for _ in 0..config.iterations_per_worker.get() {
        let call_start = Instant::now();
        let status = match client.get(&config.url).await {
            Ok(status) => status,
            Err(err) => {
                warn!("Call failed: {err}");
                FAILED_CALL_STATUS
            }
        };
        let elapsed = call_start.elapsed();

        sampler.record(elapsed);
        status_counts.increment(status);

        #[cfg(feature = "metrics")]
        record_metrics(elapsed, status);
    }

    let result = WorkerResult {
        worker,
        client_index,
        status_counts,
        elapsed: start.elapsed(),
    };

    info!(
        throughput = result.throughput(),
        status_counts = %result.status_counts,
        "End worker"
    );

    result
}

#[cfg(feature = "metrics")]
fn record_metrics(elapsed: Duration, status: u16) {
    metrics::histogram!("volley_call_latency_seconds").record(elapsed.as_secs_f64());
    metrics::counter!("volley_calls_total", "status" => status.to_string()).increment(1);
}
