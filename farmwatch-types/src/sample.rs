//! Sample points and series.

use chrono::{DateTime, Utc};

/// A single (timestamp, value) reading for one metric.
///
/// A point is only meaningful when its value is finite; decoders reject
/// anything else before a point is constructed, and [`SamplePoint::is_valid`]
/// lets later stages re-check.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplePoint {
    /// Wall-clock instant the reading was taken (or received, for live data).
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// A point stamped with the current wall-clock time.
    pub fn now(value: f64) -> Self {
        Self::new(Utc::now(), value)
    }

    /// Returns true if the value is a finite number.
    pub fn is_valid(&self) -> bool {
        self.value.is_finite()
    }
}

/// An ordered sequence of points, ascending by arrival or measurement time.
pub type Series = Vec<SamplePoint>;

/// Parse a bare numeric payload into a finite value.
///
/// Surrounding whitespace is ignored. `NaN`, infinities and anything that is
/// not a number yield `None`.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
