//! In-memory connector for driving channels from tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use tokio::sync::mpsc;

use super::connector::{ByteStream, Connector};
use crate::error::StreamError;

type Chunk = Result<Vec<u8>, StreamError>;

#[derive(Debug)]
struct Feed {
    tx: Option<mpsc::UnboundedSender<Chunk>>,
    rx: Option<mpsc::UnboundedReceiver<Chunk>>,
}

impl Feed {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: Some(tx),
            rx: Some(rx),
        }
    }

    fn send(&self, chunk: Chunk) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(chunk);
        }
    }
}

/// Connector whose streams are fed by the test.
///
/// Each path has a feed; text pushed before the channel connects is
/// buffered. A second connect on the same path gets a fresh feed.
#[derive(Debug, Default)]
pub struct ScriptedConnector {
    feeds: Mutex<HashMap<String, Feed>>,
    refused: Mutex<HashSet<String>>,
    opened: Mutex<Vec<String>>,
}

impl ScriptedConnector {
    fn with_feed<R>(&self, path: &str, f: impl FnOnce(&mut Feed) -> R) -> R {
        let mut feeds = self.feeds.lock().unwrap();
        let feed = feeds.entry(path.to_string()).or_insert_with(Feed::new);
        f(feed)
    }

    /// Send raw event-stream text on `path`.
    pub fn push(&self, path: &str, text: &str) {
        self.with_feed(path, |feed| feed.send(Ok(text.as_bytes().to_vec())));
    }

    /// Inject a transport error on `path`.
    pub fn fail(&self, path: &str, reason: &str) {
        self.with_feed(path, |feed| {
            feed.send(Err(StreamError::Transport(reason.to_string())))
        });
    }

    /// End the stream on `path` as if the server closed it.
    ///
    /// Text already pushed is still delivered before the end.
    pub fn end(&self, path: &str) {
        self.with_feed(path, |feed| feed.tx = None);
    }

    /// Make future connects on `path` fail.
    pub fn refuse(&self, path: &str) {
        self.refused.lock().unwrap().insert(path.to_string());
    }

    /// Paths connected so far, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, path: &str) -> Result<ByteStream, StreamError> {
        self.opened.lock().unwrap().push(path.to_string());
        if self.refused.lock().unwrap().contains(path) {
            return Err(StreamError::Status(503));
        }

        let rx = self.with_feed(path, |feed| match feed.rx.take() {
            Some(rx) => rx,
            None => {
                *feed = Feed::new();
                feed.rx.take().unwrap()
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        });
        Ok(stream.boxed())
    }
}
