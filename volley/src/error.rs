use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Client pool requires at least one client")]
    EmptyPool,

    #[error("Unable to build HTTP client: {0}")]
    Client(#[from] ClientError),

    #[error("Worker task failed: {0}")]
    WorkerFailed(#[from] JoinError),
}

/// Failure of a single call. Counted by the worker, never propagated out of a run.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}
