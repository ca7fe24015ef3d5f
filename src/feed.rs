//! Intrusion alert feed.
//!
//! Subscribes to the alert stream and keeps every decoded alert in an
//! [`AlertLog`], newest first. Like a live channel, a transport error
//! closes the feed; [`AlertFeed::open`] starts a fresh subscription.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use farmwatch_types::AlertEntry;

use crate::data::AlertLog;
use crate::source::{
    AlertDecoder, ChannelEvent, ChannelState, Connector, StreamChannel, ALERT_STREAM_PATH,
};

#[derive(Debug)]
struct Routed {
    generation: u64,
    event: ChannelEvent<AlertEntry>,
}

/// Owner of the alert subscription and its log.
#[derive(Debug)]
pub struct AlertFeed {
    connector: Arc<dyn Connector>,
    channel: Option<StreamChannel>,
    log: AlertLog,
    generation: u64,
    last_error: Option<String>,
    tx: mpsc::UnboundedSender<Routed>,
    rx: mpsc::UnboundedReceiver<Routed>,
}

impl AlertFeed {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            connector,
            channel: None,
            log: AlertLog::new(),
            generation: 0,
            last_error: None,
            tx,
            rx,
        }
    }

    /// Open the subscription, replacing any previous one.
    ///
    /// The log is kept across reopens. Must be called from within a tokio
    /// runtime.
    pub fn open(&mut self) {
        self.close();
        self.generation += 1;
        self.last_error = None;

        let generation = self.generation;
        let tx = self.tx.clone();
        self.channel = Some(StreamChannel::open(
            self.connector.clone(),
            ALERT_STREAM_PATH,
            AlertDecoder,
            move |event| tx.send(Routed { generation, event }).is_ok(),
        ));
        info!("Alert feed opened");
    }

    /// Close the subscription. Alerts still queued are discarded.
    pub fn close(&mut self) {
        if let Some(mut channel) = self.channel.take() {
            channel.close();
            self.generation += 1;
            while self.rx.try_recv().is_ok() {}
            debug!("Alert feed closed");
        }
    }

    /// Record every queued alert. Returns how many were added.
    pub fn poll(&mut self) -> usize {
        let mut added = 0;
        while let Ok(routed) = self.rx.try_recv() {
            if routed.generation != self.generation {
                continue;
            }
            match routed.event {
                ChannelEvent::Item(entry) => {
                    debug!("Alert received: {}", entry.kind);
                    self.log.push(entry);
                    added += 1;
                }
                ChannelEvent::Connected => self.last_error = None,
                ChannelEvent::Failed(reason) => {
                    warn!("Alert feed closed after error: {}", reason);
                    self.last_error = Some(reason);
                }
                ChannelEvent::Ended => info!("Alert feed ended by server"),
            }
        }
        added
    }

    /// State of the subscription; `Closed` when never opened.
    pub fn state(&self) -> ChannelState {
        self.channel
            .as_ref()
            .map(StreamChannel::state)
            .unwrap_or(ChannelState::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    pub fn log(&self) -> &AlertLog {
        &self.log
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::testing::ScriptedConnector;
    use tokio::time::{sleep, Duration};

    fn alert(kind: &str) -> String {
        format!(
            "data: {{\"timestamp\":\"2024-01-01T09:00:00\",\"type\":\"{}\",\"details\":{{\"zone\":3}}}}\n\n",
            kind
        )
    }

    async fn settle() {
        sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_alerts_newest_first() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut feed = AlertFeed::new(connector.clone());
        feed.open();
        settle().await;

        connector.push(ALERT_STREAM_PATH, &alert("motion"));
        connector.push(ALERT_STREAM_PATH, "data: not json\n\n");
        connector.push(ALERT_STREAM_PATH, &alert("door"));
        settle().await;

        assert_eq!(feed.poll(), 2);
        let kinds: Vec<&str> = feed.log().iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["door", "motion"]);
        assert_eq!(
            feed.log().latest().unwrap().display_line(),
            "[2024-01-01T09:00:00] Type: door, Details: {\"zone\":3}"
        );
    }

    #[tokio::test]
    async fn test_error_closes_and_reopen_keeps_log() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut feed = AlertFeed::new(connector.clone());
        feed.open();
        settle().await;

        connector.push(ALERT_STREAM_PATH, &alert("motion"));
        connector.fail(ALERT_STREAM_PATH, "reset by peer");
        settle().await;

        assert_eq!(feed.poll(), 1);
        assert_eq!(feed.state(), ChannelState::Closed);
        assert!(feed.last_error().unwrap().contains("reset by peer"));

        feed.open();
        settle().await;
        assert!(feed.last_error().is_none());
        connector.push(ALERT_STREAM_PATH, &alert("door"));
        settle().await;

        assert_eq!(feed.poll(), 1);
        assert_eq!(feed.log().len(), 2);
        assert_eq!(connector.opened().len(), 2);
    }

    #[tokio::test]
    async fn test_close_discards_pending() {
        let connector = Arc::new(ScriptedConnector::default());
        let mut feed = AlertFeed::new(connector.clone());
        feed.open();
        settle().await;

        connector.push(ALERT_STREAM_PATH, &alert("motion"));
        settle().await;
        feed.close();

        assert_eq!(feed.poll(), 0);
        assert!(feed.log().is_empty());
        assert!(!feed.is_open());
        assert_eq!(feed.state(), ChannelState::Closed);
    }
}
