use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use volley_core::LatencySummary;

/// Bounded, thread-safe latency recorder.
///
/// Samples go into a ring buffer of fixed capacity; once full, each new sample overwrites the
/// oldest one. The total number of recorded calls is tracked separately so throughput stays
/// exact even when percentiles only reflect the most recent `capacity` samples.
///
/// The sampler has two phases. Workers call [`record`](Self::record) while the run is going,
/// then [`finalize`](Self::finalize) freezes it. Samples recorded after that are dropped.
#[derive(Debug)]
pub struct LatencySampler {
    state: Mutex<SamplerState>,
}

#[derive(Debug)]
struct SamplerState {
    samples: Vec<Duration>,
    capacity: usize,
    next: usize,
    count: u64,
    dropped: u64,
    wall_time: Option<Duration>,
    finalized: bool,
}

impl LatencySampler {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            state: Mutex::new(SamplerState {
                samples: Vec::with_capacity(capacity.get()),
                capacity: capacity.get(),
                next: 0,
                count: 0,
                dropped: 0,
                wall_time: None,
                finalized: false,
            }),
        }
    }

    pub fn record(&self, elapsed: Duration) {
        let mut state = self.lock();

        if state.finalized {
            state.dropped += 1;
            trace!("Sample recorded after finalize, dropping.");
            return;
        }

        state.count += 1;
        if state.samples.len() < state.capacity {
            state.samples.push(elapsed);
        } else {
            let next = state.next;
            state.samples[next] = elapsed;
        }
        state.next = (state.next + 1) % state.capacity;
    }

    pub fn set_wall_time(&self, wall_time: Duration) {
        self.lock().wall_time = Some(wall_time);
    }

    /// Freeze the sampler and compute the summary of the retained samples. Calling this again
    /// without new samples yields the same summary.
    pub fn finalize(&self) -> LatencySummary {
        let (mut samples, count, wall_time) = {
            let mut state = self.lock();
            state.finalized = true;
            (state.samples.clone(), state.count, state.wall_time)
        };

        samples.sort_unstable();
        summarize(&samples, count, wall_time)
    }

    /// Number of samples ever recorded, including those overwritten in the ring.
    pub fn count(&self) -> u64 {
        self.lock().count
    }

    /// Number of samples discarded because they arrived after [`finalize`](Self::finalize).
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }

    fn lock(&self) -> MutexGuard<'_, SamplerState> {
        // Every mutation leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn summarize(sorted: &[Duration], count: u64, wall_time: Option<Duration>) -> LatencySummary {
    let cumulative: Duration = sorted.iter().sum();
    // Over the wall time every call counts; over the cumulative latency only the retained
    // samples do, since that is all the cumulative sum covers.
    let rate = match wall_time {
        Some(wall_time) => calls_per_second(count, wall_time),
        None => calls_per_second(sorted.len() as u64, cumulative),
    };

    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return LatencySummary {
            count,
            wall_time,
            rate,
            ..Default::default()
        };
    };

    let n = sorted.len() as f64;
    let nanos: Vec<f64> = sorted.iter().map(|d| d.as_nanos() as f64).collect();

    let mean = nanos.iter().sum::<f64>() / n;
    let var = nanos.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;

    // A zero-length sample makes the reciprocal sum infinite.
    let harmonic_mean = if nanos.iter().any(|x| *x == 0.) {
        0.
    } else {
        n / nanos.iter().map(|x| 1. / x).sum::<f64>()
    };

    let tail = ((n * 0.05).ceil() as usize).max(1);

    LatencySummary {
        count,
        samples: sorted.len(),
        cumulative,
        min,
        max,
        range: max - min,
        mean: from_nanos(mean),
        harmonic_mean: from_nanos(harmonic_mean),
        std_dev: from_nanos(var.sqrt()),
        p50: percentile(sorted, 0.50),
        p75: percentile(sorted, 0.75),
        p90: percentile(sorted, 0.90),
        p95: percentile(sorted, 0.95),
        p99: percentile(sorted, 0.99),
        p999: percentile(sorted, 0.999),
        slowest_5p: mean_of(&sorted[sorted.len() - tail..]),
        fastest_5p: mean_of(&sorted[..tail]),
        wall_time,
        rate,
    }
}

/// Nearest-rank percentile of a non-empty, sorted slice.
fn percentile(sorted: &[Duration], quantile: f64) -> Duration {
    let rank = (sorted.len() as f64 * quantile).round() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

fn mean_of(samples: &[Duration]) -> Duration {
    let sum: f64 = samples.iter().map(|d| d.as_nanos() as f64).sum();
    from_nanos(sum / samples.len() as f64)
}

fn calls_per_second(count: u64, over: Duration) -> f64 {
    if over.is_zero() {
        0.
    } else {
        count as f64 / over.as_secs_f64()
    }
}

fn from_nanos(nanos: f64) -> Duration {
    Duration::from_nanos(nanos.round() as u64)
}
