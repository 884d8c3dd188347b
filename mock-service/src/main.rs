use metrics_exporter_prometheus::PrometheusBuilder;
use mock_service::MockState;
use std::net::SocketAddr;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_env_filter("mock_service=info,tower_http=warn")
        .init();

    PrometheusBuilder::new()
        .with_http_listener("0.0.0.0:8002".parse::<SocketAddr>()?)
        .install()?;

    let state = MockState::default();
    tokio::spawn(mock_service::tps_measure_task(state.clone()));

    let addr: SocketAddr = "0.0.0.0:3002".parse()?;
    tracing::info!("Mock service listening on {addr}");
    mock_service::run(addr, state).await
}
