//! # farmwatch-types
//!
//! Core types shared by the farmwatch client: the metric identifiers used as
//! join keys between subscriptions, buffers and charts, the sample points
//! that make up a series, and the alert entries pushed by the intrusion
//! detection stream.
//!
//! ## Features
//!
//! - `serde`: JSON serialization of every type, and the [`AlertEntry`] type
//!   (alert details are an opaque JSON payload)
//!
//! ## Example
//!
//! ```rust
//! use farmwatch_types::{MetricId, SamplePoint};
//!
//! let metric: MetricId = "soilMoisture".parse().unwrap();
//! assert_eq!(metric.event_name(), "soilMoisture_data");
//! assert_eq!(metric.history_segment(), "soil");
//!
//! let point = SamplePoint::now(41.5);
//! assert!(point.is_valid());
//! ```

mod metric;
mod sample;

#[cfg(feature = "serde")]
mod alert;

pub use metric::*;
pub use sample::*;

#[cfg(feature = "serde")]
pub use alert::*;
