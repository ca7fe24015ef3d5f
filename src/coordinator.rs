//! Live mode: one channel, buffer and chart per metric.
//!
//! The [`Coordinator`] owns every live pipeline for the duration of an
//! activation. Channel tasks only do I/O and decoding; they forward decoded
//! points into a queue tagged with the activation generation, and
//! [`Coordinator::poll`] applies them to the buffers and the sink on the
//! caller's thread. A point whose generation is not the current one belongs
//! to a torn-down activation and is discarded, so nothing that arrives after
//! [`Coordinator::deactivate`] can touch a buffer or a chart.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use farmwatch_types::{MetricId, MetricSpec, SamplePoint, Series};

use crate::data::{SeriesBuffer, MAX_POINTS};
use crate::error::RenderError;
use crate::sink::RenderSink;
use crate::source::{
    subscription_path, ChannelEvent, ChannelState, Connector, SensorDecoder, StreamChannel,
};

/// A channel event routed back to the coordinator.
#[derive(Debug)]
struct Routed {
    generation: u64,
    metric: MetricId,
    event: ChannelEvent<SamplePoint>,
}

/// Everything owned for one metric during an activation.
#[derive(Debug)]
struct Pipeline {
    channel: StreamChannel,
    buffer: SeriesBuffer,
    last_error: Option<String>,
}

#[derive(Debug)]
struct Activation {
    /// Sorted, deduplicated by metric id.
    specs: Vec<MetricSpec>,
    pipelines: BTreeMap<MetricId, Pipeline>,
}

/// Owner of all live channel/buffer/sink triples.
#[derive(Debug)]
pub struct Coordinator<S> {
    connector: Arc<dyn Connector>,
    sink: S,
    capacity: usize,
    generation: u64,
    active: Option<Activation>,
    tx: mpsc::UnboundedSender<Routed>,
    rx: mpsc::UnboundedReceiver<Routed>,
}

impl<S: RenderSink> Coordinator<S> {
    /// Create an inactive coordinator with the default window size.
    pub fn new(connector: Arc<dyn Connector>, sink: S) -> Self {
        Self::with_capacity(connector, sink, MAX_POINTS)
    }

    /// Create an inactive coordinator keeping `capacity` points per chart.
    pub fn with_capacity(connector: Arc<dyn Connector>, sink: S, capacity: usize) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            connector,
            sink,
            capacity,
            generation: 0,
            active: None,
            tx,
            rx,
        }
    }

    /// Bring up one pipeline per spec.
    ///
    /// Activating with the spec set that is already active does nothing.
    /// Any other set first tears the current activation down completely.
    /// Must be called from within a tokio runtime.
    pub fn activate(&mut self, specs: &[MetricSpec]) {
        let specs = normalize(specs);

        if let Some(active) = &self.active {
            if active.specs == specs {
                debug!("Live mode already active for {:?}", metric_ids(&specs));
                return;
            }
        }
        self.deactivate();

        self.generation += 1;
        let generation = self.generation;
        let mut pipelines = BTreeMap::new();

        for spec in &specs {
            let metric = spec.id;
            if let Err(e) = self.sink.attach(metric, &spec.label) {
                warn!("Failed to attach chart for {}: {}", metric, e);
            }

            let tx = self.tx.clone();
            let channel = StreamChannel::open(
                self.connector.clone(),
                &subscription_path(metric),
                SensorDecoder::new(metric),
                move |event| {
                    tx.send(Routed {
                        generation,
                        metric,
                        event,
                    })
                    .is_ok()
                },
            );

            pipelines.insert(
                metric,
                Pipeline {
                    channel,
                    buffer: SeriesBuffer::new(self.capacity),
                    last_error: None,
                },
            );
        }

        info!(
            "Live mode activated for {:?} (generation {})",
            metric_ids(&specs),
            generation
        );
        self.active = Some(Activation { specs, pipelines });
    }

    /// Close every channel, detach every chart and drop every buffer.
    ///
    /// Every pipeline gets a teardown attempt even if an earlier one fails;
    /// the failures are logged and returned. Does nothing when inactive.
    pub fn deactivate(&mut self) -> Vec<RenderError> {
        let Some(mut active) = self.active.take() else {
            return Vec::new();
        };

        // Invalidate anything still queued or in flight
        self.generation += 1;

        for pipeline in active.pipelines.values_mut() {
            pipeline.channel.close();
        }

        let mut failures = Vec::new();
        for metric in active.pipelines.keys() {
            if let Err(e) = self.sink.detach(*metric) {
                error!("Failed to detach chart for {}: {}", metric, e);
                failures.push(e);
            }
        }

        drop(active);
        while self.rx.try_recv().is_ok() {}

        info!("Live mode deactivated");
        failures
    }

    /// Apply every queued event. Returns the number of points appended.
    ///
    /// Non-blocking; call it from the UI loop.
    pub fn poll(&mut self) -> usize {
        let mut appended = 0;
        while let Ok(routed) = self.rx.try_recv() {
            if self.apply(routed) {
                appended += 1;
            }
        }
        appended
    }

    /// Wait for the next queued event and apply it.
    ///
    /// Returns whether it appended a point.
    pub async fn next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(routed) => self.apply(routed),
            None => false,
        }
    }

    fn apply(&mut self, routed: Routed) -> bool {
        let Routed {
            generation,
            metric,
            event,
        } = routed;

        if generation != self.generation {
            debug!("Discarding stale {} event from generation {}", metric, generation);
            return false;
        }
        let Some(pipeline) = self
            .active
            .as_mut()
            .and_then(|active| active.pipelines.get_mut(&metric))
        else {
            return false;
        };

        match event {
            ChannelEvent::Connected => {
                info!("Live channel for {} connected", metric);
                pipeline.last_error = None;
                false
            }
            ChannelEvent::Item(point) => {
                if !pipeline.buffer.append(point) {
                    return false;
                }
                let series = pipeline.buffer.snapshot();
                if let Err(e) = self.sink.update(metric, &series) {
                    warn!("Chart update failed for {}: {}", metric, e);
                }
                true
            }
            ChannelEvent::Failed(reason) => {
                warn!("Live channel for {} closed after error: {}", metric, reason);
                pipeline.last_error = Some(reason);
                false
            }
            ChannelEvent::Ended => {
                info!("Live channel for {} ended", metric);
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Metrics of the current activation, in display order.
    pub fn active_metrics(&self) -> Vec<MetricId> {
        self.active
            .as_ref()
            .map(|active| active.pipelines.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Specs of the current activation.
    pub fn active_specs(&self) -> &[MetricSpec] {
        self.active
            .as_ref()
            .map(|active| active.specs.as_slice())
            .unwrap_or(&[])
    }

    pub fn channel_state(&self, metric: MetricId) -> Option<ChannelState> {
        self.pipeline(metric).map(|p| p.channel.state())
    }

    /// Current window of `metric`, oldest first.
    pub fn snapshot(&self, metric: MetricId) -> Option<Series> {
        self.pipeline(metric).map(|p| p.buffer.snapshot())
    }

    pub fn last_error(&self, metric: MetricId) -> Option<&str> {
        self.pipeline(metric).and_then(|p| p.last_error.as_deref())
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn pipeline(&self, metric: MetricId) -> Option<&Pipeline> {
        self.active
            .as_ref()
            .and_then(|active| active.pipelines.get(&metric))
    }
}

fn normalize(specs: &[MetricSpec]) -> Vec<MetricSpec> {
    let mut specs = specs.to_vec();
    specs.sort();
    specs.dedup_by_key(|spec| spec.id);
    specs
}

fn metric_ids(specs: &[MetricSpec]) -> Vec<MetricId> {
    specs.iter().map(|spec| spec.id).collect()
}
