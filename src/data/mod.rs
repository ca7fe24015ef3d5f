//! In-memory telemetry state.
//!
//! ## Submodules
//!
//! - [`buffer`]: Fixed-capacity window of recent points backing each live chart
//! - [`alerts`]: Newest-first, unbounded log of intrusion-detection alerts
//!
//! ## Data Flow
//!
//! ```text
//! "temperature_data: 23.4" (SSE)
//!        │
//!        ▼
//! SensorDecoder ──▶ SamplePoint
//!        │
//!        ▼
//! SeriesBuffer::append()  (evicts oldest at capacity)
//!        │
//!        ▼
//! RenderSink::update(metric, snapshot)
//! ```

pub mod alerts;
pub mod buffer;

pub use alerts::AlertLog;
pub use buffer::{SeriesBuffer, MAX_POINTS};
