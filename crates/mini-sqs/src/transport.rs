//! HTTP transport collaborators.
//!
//! The client talks to the network only through these traits:
//!
//! - [`HttpTransport`]: the shared connection pool used by every regular call
//! - [`TransportFactory`]: builds a [`TransientTransport`] for a single long-poll
//!   receive, sized to that call's wait time
//!
//! The `reqwest`-backed implementations are the defaults. Tests substitute the
//! factory to observe long-poll behavior without a network.

use crate::config::PoolOptions;
use crate::error::SqsError;
use crate::signer::RequestEnvelope;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::RwLock;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Keep-alive ceiling for long-poll connections; one second past the
/// longest legal wait.
pub const LONG_POLL_KEEP_ALIVE: Duration = Duration::from_millis(21_000);

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SqsError> {
        serde_json::from_slice(&self.body).map_err(SqsError::from)
    }
}

/// Shared, pooled transport used for every non-long-poll call.
///
/// Must be safe for concurrent use without external locking.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError>;

    /// Close the pool. Later requests fail.
    async fn destroy(&self) -> Result<(), SqsError>;
}

/// Single-use transport owned by one long-poll call.
#[async_trait]
pub trait TransientTransport: Send + Sync {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError>;

    async fn close(&self) -> Result<(), SqsError>;
}

/// Settings for a long-poll transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongPollOptions {
    /// Connect and body timeout: `wait_time_seconds * 1000 + 1000` ms
    pub timeout: Duration,
    pub keep_alive: Duration,
    pub pool: PoolOptions,
}

/// Builds transports for long-poll receives.
pub trait TransportFactory: Send + Sync {
    fn connect(
        &self,
        endpoint: &str,
        options: &LongPollOptions,
    ) -> Result<Box<dyn TransientTransport>, SqsError>;
}

// ============================================================================
// reqwest implementations
// ============================================================================

/// Settings a `reqwest::Client` is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl ClientSettings {
    /// Settings for the shared pool, taken from `options` as-is.
    pub fn pooled(options: &PoolOptions) -> Self {
        Self {
            max_idle_per_host: options.max_idle_per_host,
            idle_timeout: options.idle_timeout(),
            connect_timeout: options.connect_timeout(),
            timeout: options.request_timeout(),
        }
    }

    /// Settings for a long-poll client.
    ///
    /// The pool options carry over; both timeouts follow the wait and idle
    /// connections are kept no longer than the keep-alive ceiling.
    pub fn long_poll(options: &LongPollOptions) -> Self {
        Self {
            max_idle_per_host: options.pool.max_idle_per_host,
            idle_timeout: options.pool.idle_timeout().min(options.keep_alive),
            connect_timeout: options.timeout,
            timeout: options.timeout,
        }
    }

    fn build_client(&self) -> Result<HttpClient, reqwest::Error> {
        HttpClient::builder()
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
            .connect_timeout(self.connect_timeout)
            .timeout(self.timeout)
            .build()
    }
}

/// A `reqwest::Client` bound to one endpoint that can be released.
///
/// Releasing drops the client handle so idle connections close even while
/// other parts of the client still hold the transport.
#[derive(Debug)]
struct ClientSlot {
    http_client: RwLock<Option<HttpClient>>,
    endpoint: String,
}

impl ClientSlot {
    fn new(http_client: HttpClient, endpoint: &str) -> Self {
        Self {
            http_client: RwLock::new(Some(http_client)),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    async fn send(
        &self,
        request: &RequestEnvelope,
        released_message: &str,
    ) -> Result<HttpResponse, SqsError> {
        // Clone the handle out so a release does not wait on in-flight calls.
        let http_client = self.http_client.read().await.clone();
        match http_client {
            Some(http_client) => send(&http_client, &self.endpoint, request).await,
            None => Err(SqsError::Transport {
                message: released_message.to_string(),
                source: None,
            }),
        }
    }

    async fn release(&self) {
        self.http_client.write().await.take();
    }

    async fn is_released(&self) -> bool {
        self.http_client.read().await.is_none()
    }
}

/// Connection pool backed by a shared `reqwest::Client`
#[derive(Debug)]
pub struct ReqwestPool {
    slot: ClientSlot,
    settings: ClientSettings,
}

impl ReqwestPool {
    /// Create a pool bound to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the HTTP client cannot be built.
    pub fn new(endpoint: &str, options: &PoolOptions) -> Result<Self, SqsError> {
        let settings = ClientSettings::pooled(options);
        let http_client = settings
            .build_client()
            .map_err(|e| SqsError::transport("Failed to create HTTP client", e))?;

        Ok(Self {
            slot: ClientSlot::new(http_client, endpoint),
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Whether [`HttpTransport::destroy`] has released the HTTP client.
    pub async fn is_destroyed(&self) -> bool {
        self.slot.is_released().await
    }
}

#[async_trait]
impl HttpTransport for ReqwestPool {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError> {
        self.slot
            .send(request, "Connection pool has been destroyed")
            .await
    }

    async fn destroy(&self) -> Result<(), SqsError> {
        self.slot.release().await;
        Ok(())
    }
}

/// Builds a fresh `reqwest::Client` per long poll
#[derive(Debug, Default, Clone, Copy)]
pub struct ReqwestTransportFactory;

impl TransportFactory for ReqwestTransportFactory {
    fn connect(
        &self,
        endpoint: &str,
        options: &LongPollOptions,
    ) -> Result<Box<dyn TransientTransport>, SqsError> {
        let http_client = ClientSettings::long_poll(options)
            .build_client()
            .map_err(|e| SqsError::transport("Failed to create long-poll HTTP client", e))?;

        Ok(Box::new(ReqwestTransient {
            slot: ClientSlot::new(http_client, endpoint),
        }))
    }
}

#[derive(Debug)]
struct ReqwestTransient {
    slot: ClientSlot,
}

#[async_trait]
impl TransientTransport for ReqwestTransient {
    async fn request(&self, request: &RequestEnvelope) -> Result<HttpResponse, SqsError> {
        self.slot
            .send(request, "Long-poll client has been closed")
            .await
    }

    async fn close(&self) -> Result<(), SqsError> {
        self.slot.release().await;
        Ok(())
    }
}

async fn send(
    http_client: &HttpClient,
    endpoint: &str,
    request: &RequestEnvelope,
) -> Result<HttpResponse, SqsError> {
    let method = reqwest::Method::from_bytes(request.method.as_bytes()).map_err(|e| {
        SqsError::Configuration {
            message: format!("Invalid HTTP method '{}': {}", request.method, e),
        }
    })?;
    let url = format!("{}{}", endpoint, request.path);

    let mut builder = http_client.request(method, &url);
    for (name, value) in &request.headers {
        // reqwest derives Content-Length from the body it is given.
        if name == "content-length" {
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }

    let response = builder.body(request.body.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            SqsError::transport(format!("Request timeout: {}", e), e)
        } else if e.is_connect() {
            SqsError::transport(format!("Connection failed: {}", e), e)
        } else {
            SqsError::transport(format!("HTTP request failed: {}", e), e)
        }
    })?;

    let status = response.status().as_u16();
    let body = response
        .bytes()
        .await
        .map_err(|e| SqsError::transport(format!("Failed to read response body: {}", e), e))?;

    Ok(HttpResponse::new(status, body))
}
