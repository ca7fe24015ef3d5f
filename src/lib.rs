//! # farmwatch
//!
//! A terminal dashboard and library for smart-farm sensor telemetry.
//!
//! The client subscribes to live sensor streams (temperature, humidity,
//! soil moisture) over server-sent events, keeps a rolling window per
//! metric and charts it; queries historical ranges page by page; and lists
//! intrusion alerts as they are pushed.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                          Application                          │
//! │  ┌─────────┐    ┌─────────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │   app   │───▶│ coordinator │───▶│  sink   │───▶│   ui    │ │
//! │  │ (state) │    │ query/feed  │    │ (charts)│    │         │ │
//! │  └─────────┘    └──────┬──────┘    └─────────┘    └─────────┘ │
//! │                        │                                      │
//! │                        ▼                                      │
//! │                  ┌──────────┐                                 │
//! │                  │  source  │◀── HttpConnector (SSE)          │
//! │                  │ channels │                                 │
//! │                  └──────────┘                                 │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: push subscriptions; the [`Connector`] transport and the
//!   [`StreamChannel`] lifecycle with its decoders
//! - **[`data`]**: the bounded [`SeriesBuffer`] and the [`AlertLog`]
//! - **[`coordinator`]**: live mode, one channel/buffer/chart per metric
//! - **[`query`]**: historical range queries and their cancellable fan-out
//! - **[`feed`]**: the alert subscription
//! - **[`sink`]**: the [`RenderSink`] seam and the terminal [`ChartBoard`]
//! - **[`app`]**, **[`events`]**, **[`ui`]**: the terminal application
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Live charts against a local backend
//! farmwatch --url http://localhost:8080
//!
//! # One hour of history, newest first
//! farmwatch --view history --start 2024-01-01T09:00 --end 2024-01-01T10:00 --sort desc
//!
//! # Export the same range as JSON
//! farmwatch --start 2024-01-01T09:00 --end 2024-01-01T10:00 --export history.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use farmwatch::{ChartBoard, Coordinator, HttpConnector, MetricId};
//!
//! # tokio_test::block_on(async {
//! let connector = HttpConnector::new("http://localhost:8080", Duration::from_secs(10)).unwrap();
//! let mut live = Coordinator::new(Arc::new(connector), ChartBoard::new());
//!
//! live.activate(&[MetricId::Temperature.spec(), MetricId::Humidity.spec()]);
//! loop {
//!     if live.next().await {
//!         let window = live.snapshot(MetricId::Temperature).unwrap_or_default();
//!         println!("{} temperature points", window.len());
//!     }
//! }
//! # });
//! ```

pub mod app;
pub mod config;
pub mod coordinator;
pub mod data;
pub mod error;
pub mod events;
pub mod feed;
pub mod query;
pub mod sink;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::{App, View};
pub use coordinator::Coordinator;
pub use data::{AlertLog, SeriesBuffer, MAX_POINTS};
pub use error::{QueryError, RenderError, StreamError};
pub use farmwatch_types::{AlertEntry, MetricId, MetricSpec, SamplePoint, Series};
pub use feed::AlertFeed;
pub use query::{HistoryClient, HistoryLoader, HistoryQuery, HistorySource, SortOrder, TimeRange};
pub use sink::{Chart, ChartBoard, RenderSink};
pub use source::{ChannelState, Connector, HttpConnector, StreamChannel};
