use humantime::format_duration;
use serde::Serialize;
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Occurrence count per HTTP status code. Code `0` counts calls which failed before any status
/// was received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatusCounts(BTreeMap<u16, u64>);

impl StatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, status: u16) {
        *self.0.entry(status).or_default() += 1;
    }

    /// Fold `other` into `self`. Commutative and associative, so the order workers complete in
    /// never changes the merged result.
    pub fn merge(&mut self, other: StatusCounts) {
        for (status, count) in other.0 {
            *self.0.entry(status).or_default() += count;
        }
    }

    pub fn get(&self, status: u16) -> u64 {
        self.0.get(&status).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.0.iter().map(|(status, count)| (*status, *count))
    }
}

impl FromIterator<(u16, u64)> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = (u16, u64)>>(iter: I) -> Self {
        let mut counts = Self::new();
        for (status, count) in iter {
            *counts.0.entry(status).or_default() += count;
        }
        counts
    }
}

impl fmt::Display for StatusCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// Latency digest computed once the run has finished.
///
/// `count` is every call ever recorded, `samples` only those still retained in the ring buffer.
/// All duration statistics are derived from the retained samples.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub samples: usize,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub cumulative: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub min: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub max: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub range: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub mean: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub harmonic_mean: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub std_dev: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p50: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p75: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p90: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p95: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p99: Duration,
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub p999: Duration,
    /// Mean of the slowest 5% of retained samples.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub slowest_5p: Duration,
    /// Mean of the fastest 5% of retained samples.
    #[serde_as(as = "DurationSecondsWithFrac<f64>")]
    pub fastest_5p: Duration,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub wall_time: Option<Duration>,
    /// Every recorded call per second of wall time, or retained samples per second of
    /// cumulative latency when no wall time was set.
    pub rate: f64,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={}, samples={}, rate={:.2}/s, min={}, mean={}, std={}, p50={}, p75={}, p90={}, p95={}, p99={}, max={}",
            self.count,
            self.samples,
            self.rate,
            format_duration(self.min),
            format_duration(self.mean),
            format_duration(self.std_dev),
            format_duration(self.p50),
            format_duration(self.p75),
            format_duration(self.p90),
            format_duration(self.p95),
            format_duration(self.p99),
            format_duration(self.max),
        )?;

        if let Some(wall_time) = self.wall_time {
            write!(f, ", wall_time={}", format_duration(wall_time))?;
        }

        Ok(())
    }
}

/// Final output of a run: the latency digest plus the status codes merged across all workers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AggregateReport {
    pub latency: LatencySummary,
    pub status_counts: StatusCounts,
}

impl AggregateReport {
    pub fn total_calls(&self) -> u64 {
        self.status_counts.total()
    }

    pub fn failed_calls(&self) -> u64 {
        self.status_counts.get(crate::FAILED_CALL_STATUS)
    }
}

impl fmt::Display for AggregateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, status_counts={}", self.latency, self.status_counts)
    }
}
