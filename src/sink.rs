//! Render sinks: where series are drawn.
//!
//! The coordinator and the history loader only talk to the chart layer
//! through [`RenderSink`]. [`ChartBoard`] is the terminal implementation:
//! it turns each series into plot-ready points that the ratatui views draw.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};

use farmwatch_types::{MetricId, SamplePoint};

use crate::error::RenderError;

/// Destination that visualizes one series per metric.
pub trait RenderSink {
    /// Create the chart slot for `metric`. Attaching twice keeps the slot.
    fn attach(&mut self, metric: MetricId, label: &str) -> Result<(), RenderError>;

    /// Replace the rendered content of `metric` with `series`.
    fn update(&mut self, metric: MetricId, series: &[SamplePoint]) -> Result<(), RenderError>;

    /// Release the chart slot for `metric`. Detaching twice is not an error.
    fn detach(&mut self, metric: MetricId) -> Result<(), RenderError>;
}

/// Plot-ready contents of one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub label: String,
    /// (seconds since the Unix epoch, value) pairs in series order.
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Local wall-clock labels for the first, middle and last point.
    pub x_labels: Vec<String>,
    pub last_value: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Chart {
    fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            points: Vec::new(),
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
            x_labels: Vec::new(),
            last_value: None,
            updated_at: None,
        }
    }

    fn plot(&mut self, series: &[SamplePoint]) {
        self.points = series
            .iter()
            .map(|p| (p.timestamp.timestamp_millis() as f64 / 1000.0, p.value))
            .collect();

        let first = self.points.first().map(|(x, _)| *x).unwrap_or(0.0);
        let last = self.points.last().map(|(x, _)| *x).unwrap_or(first);
        self.x_bounds = if last > first {
            [first, last]
        } else {
            [first, first + 1.0]
        };

        // Y axis starts at zero unless readings go negative
        let max = self.points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::max);
        let min = self.points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::min);
        let top = if max > 0.0 { max * 1.1 } else { 1.0 };
        self.y_bounds = [min * 1.1, top];

        self.x_labels = match series {
            [] => Vec::new(),
            [only] => vec![time_label(only)],
            _ => vec![
                time_label(&series[0]),
                time_label(&series[series.len() / 2]),
                time_label(&series[series.len() - 1]),
            ],
        };
        self.last_value = series.last().map(|p| p.value);
        self.updated_at = Some(Utc::now());
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn time_label(point: &SamplePoint) -> String {
    point
        .timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

/// Terminal chart collaborator holding one [`Chart`] per attached metric.
#[derive(Debug, Clone, Default)]
pub struct ChartBoard {
    charts: BTreeMap<MetricId, Chart>,
}

impl ChartBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(&self, metric: MetricId) -> Option<&Chart> {
        self.charts.get(&metric)
    }

    pub fn is_attached(&self, metric: MetricId) -> bool {
        self.charts.contains_key(&metric)
    }

    /// Attached metrics in display order.
    pub fn metrics(&self) -> impl Iterator<Item = MetricId> + '_ {
        self.charts.keys().copied()
    }
}

impl RenderSink for ChartBoard {
    fn attach(&mut self, metric: MetricId, label: &str) -> Result<(), RenderError> {
        self.charts
            .entry(metric)
            .or_insert_with(|| Chart::empty(label));
        Ok(())
    }

    fn update(&mut self, metric: MetricId, series: &[SamplePoint]) -> Result<(), RenderError> {
        let chart = self
            .charts
            .get_mut(&metric)
            .ok_or(RenderError::Detached(metric))?;

        if let Some(index) = series.iter().position(|p| !p.is_valid()) {
            return Err(RenderError::NonFinite { metric, index });
        }

        chart.plot(series);
        Ok(())
    }

    fn detach(&mut self, metric: MetricId) -> Result<(), RenderError> {
        self.charts.remove(&metric);
        Ok(())
    }
}
