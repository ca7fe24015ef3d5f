//! Metric identifiers and activation specs.

use std::fmt;
use std::str::FromStr;

/// One physical quantity monitored on the farm.
///
/// The id is the join key across a push subscription, its bounded buffer and
/// its chart. It also knows the names the backend uses for it on each
/// endpoint, which are not uniform (soil moisture is `soilMoisture` on the
/// push side and `soil` on the query side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum MetricId {
    Temperature,
    Humidity,
    SoilMoisture,
}

impl MetricId {
    /// Every metric, in display order.
    pub const ALL: [MetricId; 3] = [
        MetricId::Temperature,
        MetricId::Humidity,
        MetricId::SoilMoisture,
    ];

    /// Identifier used in the subscription path (`/subscribe/{id}`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricId::Temperature => "temperature",
            MetricId::Humidity => "humidity",
            MetricId::SoilMoisture => "soilMoisture",
        }
    }

    /// Named server-sent event type carrying this metric's samples.
    pub fn event_name(&self) -> &'static str {
        match self {
            MetricId::Temperature => "temperature_data",
            MetricId::Humidity => "humidity_data",
            MetricId::SoilMoisture => "soilMoisture_data",
        }
    }

    /// Path segment of the historical query endpoint (`/farm/{segment}`).
    pub fn history_segment(&self) -> &'static str {
        match self {
            MetricId::Temperature => "temperature",
            MetricId::Humidity => "humidity",
            MetricId::SoilMoisture => "soil",
        }
    }

    /// Human-readable chart label including the unit.
    pub fn label(&self) -> &'static str {
        match self {
            MetricId::Temperature => "Temperature (°C)",
            MetricId::Humidity => "Humidity (%)",
            MetricId::SoilMoisture => "Soil moisture (%)",
        }
    }

    /// Default activation spec for this metric.
    pub fn spec(self) -> MetricSpec {
        MetricSpec::new(self, self.label())
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown metric name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownMetric(pub String);

impl fmt::Display for UnknownMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown metric: {}", self.0)
    }
}

impl std::error::Error for UnknownMetric {}

impl FromStr for MetricId {
    type Err = UnknownMetric;

    /// Accepts the subscription id as well as the query segment (`soil`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temperature" => Ok(MetricId::Temperature),
            "humidity" => Ok(MetricId::Humidity),
            "soilMoisture" | "soil" => Ok(MetricId::SoilMoisture),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// A metric to bring up during a live activation, with its chart label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricSpec {
    pub id: MetricId,
    pub label: String,
}

impl MetricSpec {
    pub fn new(id: MetricId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}
