//! Transports that open push subscriptions.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::Client;
use tracing::debug;

use crate::error::StreamError;

/// Raw bytes of an open subscription, chunked however the transport likes.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, StreamError>>;

/// Opens the byte stream behind a push subscription.
///
/// `path` is relative to the backend, e.g. `subscribe/humidity` or
/// `alert/stream`. The returned stream carries server-sent event text.
#[async_trait]
pub trait Connector: Send + Sync + Debug {
    async fn connect(&self, path: &str) -> Result<ByteStream, StreamError>;

    /// Human-readable location of `path`, used in logs and the status bar.
    fn describe(&self, path: &str) -> String {
        path.to_string()
    }
}

/// Server-sent event subscriptions over HTTP.
///
/// Only the connect phase has a timeout; an established stream stays open
/// for as long as the server keeps it.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: Client,
    base_url: String,
}

impl HttpConnector {
    /// Create a connector for the given backend base URL.
    pub fn new(base_url: impl Into<String>, connect_timeout: Duration) -> Result<Self, StreamError> {
        let client = Client::builder().connect_timeout(connect_timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a connector sharing an existing HTTP client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, path: &str) -> Result<ByteStream, StreamError> {
        let url = self.url(path);
        debug!("Opening subscription {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StreamError::Status(response.status().as_u16()));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(StreamError::from));

        Ok(stream.boxed())
    }

    fn describe(&self, path: &str) -> String {
        self.url(path)
    }
}
