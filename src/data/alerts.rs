//! Append-only alert log.

use std::collections::VecDeque;

use farmwatch_types::AlertEntry;

/// Alerts received so far, newest first.
///
/// The log is unbounded and never windowed: every decoded alert is kept
/// until the log is dropped.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: VecDeque<AlertEntry>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new alert at the front of the log.
    pub fn push(&mut self, entry: AlertEntry) {
        self.entries.push_front(entry);
    }

    /// Iterate over entries, newest first.
    pub fn iter(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AlertEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(kind: &str) -> AlertEntry {
        AlertEntry {
            timestamp: "2024-01-01T00:00:00".to_string(),
            kind: kind.to_string(),
            details: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_newest_first() {
        let mut log = AlertLog::new();
        log.push(alert("first"));
        log.push(alert("second"));
        log.push(alert("third"));

        let kinds: Vec<&str> = log.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["third", "second", "first"]);
        assert_eq!(log.latest().map(|a| a.kind.as_str()), Some("third"));
    }

    #[test]
    fn test_unbounded() {
        let mut log = AlertLog::new();
        for i in 0..500 {
            log.push(alert(&i.to_string()));
        }
        assert_eq!(log.len(), 500);
    }
}
