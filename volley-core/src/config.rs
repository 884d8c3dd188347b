use crate::DEFAULT_SAMPLE_CAPACITY;
use serde::Deserialize;
use serde_with::{serde_as, DurationSeconds};
use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unable to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Run configuration, loaded once at startup and never mutated afterwards.
///
/// ```toml
/// url = "http://127.0.0.1:3002/"
/// workers = 4
/// iterations_per_worker = 10
///
/// [client_pool]
/// num_clients = 2
/// use_h2c = false
/// ```
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    pub url: Url,
    pub workers: NonZeroUsize,
    pub iterations_per_worker: NonZeroUsize,
    pub client_pool: ClientPoolConfig,

    /// Capacity of the latency ring buffer. Percentiles are computed from at most this many of
    /// the most recent samples.
    #[serde(default = "default_sample_capacity")]
    pub sample_capacity: NonZeroUsize,

    /// Deadline applied to each individual call.
    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    #[serde(rename = "request_timeout_secs")]
    pub request_timeout: Option<Duration>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientPoolConfig {
    pub num_clients: NonZeroUsize,
    #[serde(default)]
    pub use_h2c: bool,
}

impl ClientPoolConfig {
    pub fn transport_mode(&self) -> TransportMode {
        if self.use_h2c {
            TransportMode::H2c
        } else {
            TransportMode::Http1
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMode {
    /// Whatever the client negotiates by default; HTTP/1.1 for cleartext URLs.
    Http1,
    /// HTTP/2 over cleartext with prior knowledge.
    H2c,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Http1 => write!(f, "http1"),
            TransportMode::H2c => write!(f, "h2c"),
        }
    }
}

impl Configuration {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Reading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml(&contents).inspect_err(|err| {
            error!("Failed to load {}: {err}", path.display());
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: Configuration = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Total number of calls a complete run will make.
    pub fn total_calls(&self) -> usize {
        self.workers.get() * self.iterations_per_worker.get()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::Invalid(format!(
                    "url scheme must be http or https, found {other:?}"
                )))
            }
        }

        if self.client_pool.use_h2c && self.url.scheme() != "http" {
            return Err(ConfigError::Invalid(
                "use_h2c requires a cleartext http:// url".to_string(),
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_sample_capacity() -> NonZeroUsize {
    DEFAULT_SAMPLE_CAPACITY
}
