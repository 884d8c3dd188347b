//! Small HTTP target for exercising volley.
//!
//! Routes:
//! - `/` answers `200 OK`
//! - `/status/:code` answers with the given status code
//! - `/delay/ms/:delay_ms` sleeps before answering
//! - `/jitter/ms/:mean_ms` sleeps for a normally distributed time around the mean
//! - `/bytes/:len` answers with a body of `len` bytes
//! - `/max/:max_tps` answers `503` once more than `max_tps` requests per second arrive
use axum::{
    debug_handler,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use metrics::{counter, gauge};
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::{
    num::NonZeroU32,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Shared state of a running mock service.
#[derive(Clone, Default)]
pub struct MockState {
    hits: Arc<AtomicU64>,
    limiters: Arc<Mutex<HashMap<u32, Arc<DefaultDirectRateLimiter>>>>,
}

impl MockState {
    /// Total requests served since startup.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Requests served since the last call.
    pub fn take_hits(&self) -> u64 {
        self.hits.swap(0, Ordering::Relaxed)
    }

    fn hit(&self) {
        counter!("mock_service_requests_total").increment(1);
        self.hits.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/", get(ok))
        .route("/status/:code", get(status))
        .route("/delay/ms/:delay_ms", get(delay))
        .route("/jitter/ms/:mean_ms", get(jitter))
        .route("/bytes/:len", get(bytes))
        .route("/max/:max_tps", get(max))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: MockState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

pub async fn run(addr: SocketAddr, state: MockState) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    serve(listener, state).await?;
    Ok(())
}

/// Bind an ephemeral port on localhost and serve from a background task.
pub async fn spawn() -> std::io::Result<(SocketAddr, MockState)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockState::default();

    let served = state.clone();
    tokio::spawn(async move {
        if let Err(err) = serve(listener, served).await {
            tracing::error!("Mock service stopped: {err}");
        }
    });

    Ok((addr, state))
}

#[debug_handler]
async fn ok(State(state): State<MockState>) -> &'static str {
    state.hit();
    "ok"
}

#[debug_handler]
async fn status(State(state): State<MockState>, Path(code): Path<u16>) -> StatusCode {
    state.hit();
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

#[debug_handler]
async fn delay(State(state): State<MockState>, Path(delay_ms): Path<u64>) {
    state.hit();
    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
}

#[debug_handler]
async fn jitter(
    State(state): State<MockState>,
    Path(mean_ms): Path<u64>,
) -> Result<(), StatusCode> {
    state.hit();
    let mean = mean_ms as f64;
    let normal = Normal::new(mean, mean / 4.).map_err(|_| StatusCode::BAD_REQUEST)?;
    let v: f64 = normal.sample(&mut rand::thread_rng()).max(0.);
    tokio::time::sleep(Duration::from_secs_f64(v / 1e3)).await;
    Ok(())
}

#[debug_handler]
async fn bytes(State(state): State<MockState>, Path(len): Path<usize>) -> Vec<u8> {
    state.hit();
    vec![b'x'; len]
}

#[debug_handler]
async fn max(State(state): State<MockState>, Path(max_tps): Path<u32>) -> StatusCode {
    state.hit();

    let Some(max_tps) = NonZeroU32::new(max_tps) else {
        return StatusCode::BAD_REQUEST;
    };

    let limiter = {
        let mut limiters = state
            .limiters
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        limiters
            .entry(max_tps.get())
            .or_insert_with(|| Arc::new(rate_limiter(max_tps)))
            .clone()
    };

    match limiter.check() {
        Ok(_) => StatusCode::OK,
        Err(_) => {
            debug!("Rate limit of {max_tps} TPS exceeded");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}

/// Log the number of requests served each second.
pub async fn tps_measure_task(state: MockState) {
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let transactions = state.take_hits();
        gauge!("mock_service_tps").set(transactions as f64);
        tracing::info!("{transactions} TPS");
    }
}
