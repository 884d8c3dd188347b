use volley_tests::*;

use std::num::NonZeroUsize;
use std::time::Duration;
use volley::{Engine, EngineError, StatusCounts, FAILED_CALL_STATUS};

fn only(status: u16, count: u64) -> StatusCounts {
    [(status, count)].into_iter().collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn http1_all_success() {
    init();
    let (addr, state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/", "", "num_clients = 2");
    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(200, 40));
    assert_eq!(report.latency.count, 40);
    assert_eq!(report.latency.samples, 40);
    assert!(report.latency.rate > 0.);
    assert_eq!(state.hits(), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn h2c_all_success() {
    init();
    let (addr, state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/", "", "num_clients = 2\nuse_h2c = true");
    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(200, 40));
    assert_eq!(state.hits(), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn error_statuses_are_counted() {
    init();
    let (addr, _state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/status/503", "", "num_clients = 3");
    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(503, 40));
    assert_eq!(report.failed_calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn connection_failures_do_not_abort() {
    init();
    let addr = closed_addr().await;

    let config = config(addr, "/", "request_timeout_secs = 5", "num_clients = 2");
    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(FAILED_CALL_STATUS, 40));
    assert_eq!(report.latency.count, 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn slow_calls_hit_request_timeout() {
    init();
    let (addr, _state) = mock_service::spawn().await.unwrap();

    let mut config = config(
        addr,
        "/delay/ms/3000",
        "request_timeout_secs = 1",
        "num_clients = 1",
    );
    config.workers = NonZeroUsize::new(2).unwrap();
    config.iterations_per_worker = NonZeroUsize::new(1).unwrap();

    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(FAILED_CALL_STATUS, 2));
    assert!(report.latency.max < Duration::from_millis(2500));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn large_bodies_are_drained() {
    init();
    let (addr, state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/bytes/262144", "", "num_clients = 1");
    let report = volley::run(config).await.unwrap();

    assert_eq!(report.status_counts, only(200, 40));
    assert_eq!(state.hits(), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn latency_reflects_server_delay() {
    init();
    let (addr, _state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/delay/ms/20", "", "num_clients = 4");
    let report = Engine::from_config(config).unwrap().run().await.unwrap();

    assert!(report.latency.min >= Duration::from_millis(20));
    assert!(report.latency.p50 >= Duration::from_millis(20));
    assert!(report.latency.p99 <= report.latency.max);

    // Four workers in parallel, so the whole run takes far less than the summed latency.
    let wall_time = report.latency.wall_time.unwrap();
    assert!(wall_time < report.latency.cumulative);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(30_000)]
async fn report_serializes() {
    init();
    let (addr, _state) = mock_service::spawn().await.unwrap();

    let config = config(addr, "/", "", "num_clients = 1");
    let report = volley::run(config).await.unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status_counts"]["200"], 40);
    assert_eq!(json["latency"]["count"], 40);
    assert!(json["latency"]["p99"].is_f64());
}

#[test]
fn empty_pool_fails_before_running() {
    let res = volley::ClientPool::<volley::ReqwestClient>::build(
        0,
        volley::TransportMode::Http1,
        None,
    );
    assert!(matches!(res, Err(EngineError::EmptyPool)));
}
