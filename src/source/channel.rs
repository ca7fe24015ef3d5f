//! Push subscription lifecycle.
//!
//! A [`StreamChannel`] owns one subscription: a background task connects,
//! frames the byte stream into server-sent events, decodes them and hands
//! every decoded item to an `emit` callback in arrival order. The handle
//! owns the task and the channel state; closing or dropping it aborts the
//! task.

use std::fmt;
use std::sync::Arc;

use eventsource_stream::{EventStreamError, Eventsource};
use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::connector::Connector;
use super::decode::{Decode, Decoded};

/// Connection state of a channel.
///
/// `Closed` is terminal: once a channel reaches it, nothing moves it back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Open,
    Erroring,
    Closed,
}

impl ChannelState {
    /// Returns a short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
            ChannelState::Erroring => "error",
            ChannelState::Closed => "closed",
        }
    }
}

/// Notifications emitted by a channel task.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<T> {
    /// The subscription was established. Emitted at most once.
    Connected,
    /// A decoded item.
    Item(T),
    /// A transport failure; the channel is closed after this.
    Failed(String),
    /// The server ended the stream.
    Ended,
}

/// Handle to one open push subscription.
pub struct StreamChannel {
    name: String,
    state: Arc<watch::Sender<ChannelState>>,
    task: Option<JoinHandle<()>>,
}

impl StreamChannel {
    /// Open a subscription on `path` and start delivering decoded events.
    ///
    /// `emit` is called from the channel task for every notification. When
    /// it returns false the receiver is gone and the task stops.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<D, F>(connector: Arc<dyn Connector>, path: &str, decoder: D, emit: F) -> Self
    where
        D: Decode,
        F: FnMut(ChannelEvent<D::Item>) -> bool + Send + 'static,
    {
        let name = connector.describe(path);
        let (state_tx, _) = watch::channel(ChannelState::Connecting);
        let state = Arc::new(state_tx);

        let task = tokio::spawn(run(
            connector,
            path.to_string(),
            name.clone(),
            decoder,
            emit,
            state.clone(),
        ));

        Self {
            name,
            state,
            task: Some(task),
        }
    }

    /// Current state.
    pub fn state(&self) -> ChannelState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<ChannelState> {
        self.state.subscribe()
    }

    /// Location of the subscription, for display.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ChannelState::Closed
    }

    /// Terminate the subscription. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            debug!("Closed subscription {}", self.name);
        }
        transition(&self.state, ChannelState::Closed);
    }
}

impl Drop for StreamChannel {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for StreamChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamChannel")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Move to `next` unless the channel is already closed.
fn transition(state: &watch::Sender<ChannelState>, next: ChannelState) -> bool {
    state.send_if_modified(|current| {
        if *current == ChannelState::Closed || *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

async fn run<D, F>(
    connector: Arc<dyn Connector>,
    path: String,
    name: String,
    decoder: D,
    mut emit: F,
    state: Arc<watch::Sender<ChannelState>>,
) where
    D: Decode,
    F: FnMut(ChannelEvent<D::Item>) -> bool + Send + 'static,
{
    let stream = match connector.connect(&path).await {
        Ok(stream) => stream,
        Err(e) => {
            fail(&state, &name, e.to_string(), &mut emit);
            return;
        }
    };

    transition(&state, ChannelState::Open);
    info!("Subscription {} connected", name);
    if !emit(ChannelEvent::Connected) {
        return;
    }

    let mut events = stream.eventsource();
    while let Some(next) = events.next().await {
        match next {
            Ok(event) => match decoder.decode(&event) {
                Decoded::Item(item) => {
                    if !emit(ChannelEvent::Item(item)) {
                        debug!("Receiver for {} dropped, stopping", name);
                        return;
                    }
                }
                Decoded::Connect => debug!("Server acknowledged subscription {}", name),
                Decoded::Ignored => debug!("Ignoring '{}' event on {}", event.event, name),
                Decoded::Malformed(reason) => warn!("Dropping event on {}: {}", name, reason),
            },
            Err(EventStreamError::Transport(e)) => {
                fail(&state, &name, e.to_string(), &mut emit);
                return;
            }
            Err(e) => warn!("Dropping undecodable frame on {}: {:?}", name, e),
        }
    }

    info!("Subscription {} ended by server", name);
    transition(&state, ChannelState::Closed);
    emit(ChannelEvent::Ended);
}

fn fail<T, F>(state: &watch::Sender<ChannelState>, name: &str, reason: String, emit: &mut F)
where
    F: FnMut(ChannelEvent<T>) -> bool,
{
    transition(state, ChannelState::Erroring);
    error!("Subscription {} failed: {}", name, reason);
    emit(ChannelEvent::Failed(reason));
    transition(state, ChannelState::Closed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::decode::{AlertDecoder, SensorDecoder};
    use crate::source::testing::ScriptedConnector;
    use farmwatch_types::{AlertEntry, MetricId, SamplePoint};
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Duration};

    type Inbox<T> = mpsc::UnboundedReceiver<ChannelEvent<T>>;

    fn open_sensor(
        connector: &Arc<ScriptedConnector>,
        metric: MetricId,
    ) -> (StreamChannel, Inbox<SamplePoint>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let path = format!("subscribe/{}", metric);
        let channel = StreamChannel::open(
            connector.clone(),
            &path,
            SensorDecoder::new(metric),
            move |event| tx.send(event).is_ok(),
        );
        (channel, rx)
    }

    fn drain<T>(rx: &mut Inbox<T>) -> Vec<ChannelEvent<T>> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn values(events: &[ChannelEvent<SamplePoint>]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                ChannelEvent::Item(p) => Some(p.value),
                _ => None,
            })
            .collect()
    }

    async fn settle() {
        sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_open_emits_connected_once() {
        let connector = Arc::new(ScriptedConnector::default());
        let (channel, mut rx) = open_sensor(&connector, MetricId::Temperature);
        assert_eq!(channel.state(), ChannelState::Connecting);

        connector.push("subscribe/temperature", "event: connect\ndata: ok\n\n");
        connector.push("subscribe/temperature", "event: connect\ndata: ok\n\n");
        settle().await;

        assert_eq!(channel.state(), ChannelState::Open);
        let events = drain(&mut rx);
        let connected = events
            .iter()
            .filter(|e| matches!(e, ChannelEvent::Connected))
            .count();
        assert_eq!(connected, 1);
    }

    #[tokio::test]
    async fn test_decodes_in_arrival_order() {
        let connector = Arc::new(ScriptedConnector::default());
        let (_channel, mut rx) = open_sensor(&connector, MetricId::Humidity);

        connector.push(
            "subscribe/humidity",
            "event: humidity_data\ndata: 51\n\nevent: humidity_data\ndata: 52.5\n\n",
        );
        // Frames may be split across chunks
        connector.push("subscribe/humidity", "event: humidity_da");
        connector.push("subscribe/humidity", "ta\ndata: 53\n\n");
        settle().await;

        assert_eq!(values(&drain(&mut rx)), vec![51.0, 52.5, 53.0]);
    }

    #[tokio::test]
    async fn test_malformed_payload_dropped() {
        let connector = Arc::new(ScriptedConnector::default());
        let (channel, mut rx) = open_sensor(&connector, MetricId::SoilMoisture);

        connector.push(
            "subscribe/soilMoisture",
            "event: soilMoisture_data\ndata: dry\n\nevent: soilMoisture_data\ndata: 33\n\n",
        );
        settle().await;

        assert_eq!(values(&drain(&mut rx)), vec![33.0]);
        assert_eq!(channel.state(), ChannelState::Open);
    }

    #[tokio::test]
    async fn test_transport_error_closes_channel() {
        let connector = Arc::new(ScriptedConnector::default());
        let (channel, mut rx) = open_sensor(&connector, MetricId::Temperature);
        let mut states = channel.watch();

        connector.fail("subscribe/temperature", "connection reset");
        settle().await;

        assert_eq!(channel.state(), ChannelState::Closed);
        assert!(states.has_changed().unwrap());
        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|e| matches!(e, ChannelEvent::Failed(reason) if reason.contains("connection reset"))));

        // No reconnect: later data on the same path is never delivered
        connector.push("subscribe/temperature", "event: temperature_data\ndata: 1\n\n");
        settle().await;
        assert!(values(&drain(&mut rx)).is_empty());
    }

    #[tokio::test]
    async fn test_refused_connection() {
        let connector = Arc::new(ScriptedConnector::default());
        connector.refuse("subscribe/humidity");
        let (channel, mut rx) = open_sensor(&connector, MetricId::Humidity);
        settle().await;

        assert_eq!(channel.state(), ChannelState::Closed);
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ChannelEvent::Failed(_)));
    }

    #[tokio::test]
    async fn test_server_end() {
        let connector = Arc::new(ScriptedConnector::default());
        let (channel, mut rx) = open_sensor(&connector, MetricId::Humidity);
        connector.push("subscribe/humidity", "event: humidity_data\ndata: 40\n\n");
        connector.end("subscribe/humidity");
        settle().await;

        assert_eq!(channel.state(), ChannelState::Closed);
        let events = drain(&mut rx);
        assert_eq!(events.last(), Some(&ChannelEvent::Ended));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let connector = Arc::new(ScriptedConnector::default());
        let (mut channel, mut rx) = open_sensor(&connector, MetricId::Temperature);
        settle().await;

        channel.close();
        channel.close();
        assert!(channel.is_closed());

        connector.push("subscribe/temperature", "event: temperature_data\ndata: 9\n\n");
        settle().await;
        assert!(values(&drain(&mut rx)).is_empty());
    }

    #[tokio::test]
    async fn test_alert_channel() {
        let connector = Arc::new(ScriptedConnector::default());
        let (tx, mut rx) = mpsc::unbounded_channel::<ChannelEvent<AlertEntry>>();
        let _channel = StreamChannel::open(
            connector.clone(),
            "alert/stream",
            AlertDecoder,
            move |event| tx.send(event).is_ok(),
        );

        connector.push(
            "alert/stream",
            "data: {\"timestamp\":\"t1\",\"type\":\"SCAN\",\"details\":{}}\n\ndata: oops\n\n",
        );
        settle().await;

        let alerts: Vec<String> = drain(&mut rx)
            .into_iter()
            .filter_map(|e| match e {
                ChannelEvent::Item(a) => Some(a.kind),
                _ => None,
            })
            .collect();
        assert_eq!(alerts, vec!["SCAN".to_string()]);
    }
}
