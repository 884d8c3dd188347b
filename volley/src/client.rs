use crate::error::ClientError;
use reqwest::Client;
use std::time::Duration;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};
use url::Url;
use volley_core::TransportMode;

/// Anything able to issue a GET and report the resulting status code.
///
/// Handles are cloned out of the [`ClientPool`](crate::ClientPool) and may be used from many
/// workers at once, so implementations are expected to be cheap to clone and internally shared.
#[trait_variant::make(Send)]
pub trait HttpClient: Clone + Send + Sync + 'static {
    /// Perform one GET against `url`, returning the status code once the body has been read in
    /// full.
    async fn get(&self, url: &Url) -> Result<u16, ClientError>;
}

/// [`HttpClient`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestClient {
    inner: Client,
}

impl ReqwestClient {
    pub fn new(mode: TransportMode, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        if mode == TransportMode::H2c {
            builder = builder.http2_prior_knowledge();
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url) -> Result<u16, ClientError> {
        let response = self.inner.get(url.clone()).send().await?;
        let status = response.status().as_u16();
        debug!(status, "Got response");

        // NOTE: The body is always drained so the connection can go back to the pool, and so
        // that timing covers the full response rather than just the headers.
        if let Err(err) = response.bytes().await {
            warn!("Unable to drain response body: {err}");
        }

        Ok(status)
    }
}
