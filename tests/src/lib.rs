//! Shared helpers for the end-to-end tests in `tests/`.
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::FmtSubscriber;
use volley::Configuration;

pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter("volley=debug,mock_service=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Configuration pointing at `path` on the given mock service address.
pub fn config(addr: SocketAddr, path: &str, extra: &str, client_pool: &str) -> Configuration {
    Configuration::from_toml(&format!(
        r#"
        url = "http://{addr}{path}"
        workers = 4
        iterations_per_worker = 10
        {extra}

        [client_pool]
        {client_pool}
        "#
    ))
    .unwrap()
}

/// Address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
