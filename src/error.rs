//! Error types for subscriptions, historical queries and rendering.
//!
//! None of these are fatal to the client: stream errors close one channel,
//! query errors leave one chart stale, render errors skip one update.

use thiserror::Error;

use farmwatch_types::MetricId;

/// Errors raised by a push subscription.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Server answered the subscription with a non-success status.
    #[error("Subscription rejected with status {0}")]
    Status(u16),

    /// The byte stream failed after it was established.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Timeout waiting for the server.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StreamError::Timeout
        } else if err.is_connect() {
            StreamError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            StreamError::Status(status.as_u16())
        } else {
            StreamError::Transport(err.to_string())
        }
    }
}

/// Errors raised by a historical query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Backend answered with a non-success status.
    #[error("Backend returned status {0}")]
    Status(u16),

    /// Failed to parse the response body.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The requested range ends before it starts.
    #[error("Invalid range: end {end} precedes start {start}")]
    InvalidRange { start: String, end: String },
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            QueryError::Timeout
        } else if err.is_connect() {
            QueryError::Connection(err.to_string())
        } else if err.is_decode() {
            QueryError::Parse(err.to_string())
        } else {
            QueryError::Http(err.to_string())
        }
    }
}

/// Errors raised by the chart collaborator when asked to draw.
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    /// The metric's chart was never attached or has been detached.
    #[error("No chart attached for {0}")]
    Detached(MetricId),

    /// The series holds a value the chart cannot plot.
    #[error("Chart for {metric} rejected a non-finite value at index {index}")]
    NonFinite { metric: MetricId, index: usize },

    /// The collaborator failed for another reason.
    #[error("Render failed for {metric}: {reason}")]
    Failed { metric: MetricId, reason: String },
}
