//! Push subscriptions for live telemetry and alerts.
//!
//! This module separates the transport ([`Connector`]), which produces raw
//! server-sent event bytes, from the channel ([`StreamChannel`]), which owns
//! one subscription's lifecycle and decodes its events with a [`Decode`]
//! implementation.
//!
//! ```text
//!  Connector::connect("subscribe/humidity")
//!        │  bytes
//!        ▼
//!  eventsource framing ──▶ Decode ──▶ emit(ChannelEvent::Item)
//!        │
//!        └─ transport error ──▶ Erroring ──▶ Closed (no reconnect)
//! ```

mod channel;
mod connector;
mod decode;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::{ChannelEvent, ChannelState, StreamChannel};
pub use connector::{ByteStream, Connector, HttpConnector};
pub use decode::{AlertDecoder, Decode, Decoded, SensorDecoder, CONNECT_EVENT, MESSAGE_EVENT};

/// Subscription path for a metric's live stream.
pub fn subscription_path(metric: farmwatch_types::MetricId) -> String {
    format!("subscribe/{}", metric.as_str())
}

/// Subscription path of the alert stream.
pub const ALERT_STREAM_PATH: &str = "alert/stream";
