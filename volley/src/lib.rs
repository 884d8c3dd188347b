#![cfg_attr(docsrs, feature(doc_cfg))]
//! Concurrent HTTP load generator.
//!
//! A run spawns a fixed number of workers, each issuing a fixed number of sequential GETs
//! against one URL through a client taken round-robin from a [`ClientPool`]. Every call's
//! latency goes into a shared [`LatencySampler`], and each worker counts the status codes it
//! saw. Once all workers have finished the [`Engine`] merges everything into an
//! [`AggregateReport`].

mod client;
mod engine;
mod error;
mod pool;
mod sampler;
mod worker;

pub use client::{HttpClient, ReqwestClient};
pub use engine::{merge_results, Engine};
pub use error::{ClientError, EngineError};
pub use pool::ClientPool;
pub use sampler::LatencySampler;
pub use worker::WorkerResult;

pub use volley_core::{
    AggregateReport, ClientPoolConfig, ConfigError, Configuration, LatencySummary, StatusCounts,
    TransportMode, DEFAULT_SAMPLE_CAPACITY, FAILED_CALL_STATUS,
};

/// Run the load test described by `config` with `reqwest` clients.
pub async fn run(config: Configuration) -> Result<AggregateReport, EngineError> {
    Engine::from_config(config)?.run().await
}
