//! Intrusion-detection alert entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One alert pushed on the alert stream.
///
/// The timestamp is kept as the backend formatted it; alerts are displayed,
/// never charted, so it is not interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Opaque structured payload, rendered as JSON.
    pub details: Value,
}

impl AlertEntry {
    /// Parse an alert from a JSON payload.
    ///
    /// All three fields are required. A `timestamp` may be a string or a
    /// number; numbers are kept in their JSON form.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Wire {
            timestamp: Value,
            #[serde(rename = "type")]
            kind: String,
            details: Value,
        }

        let wire: Wire = serde_json::from_str(payload)?;
        let timestamp = match wire.timestamp {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Ok(Self {
            timestamp,
            kind: wire.kind,
            details: wire.details,
        })
    }

    /// Single-line display form: `[timestamp] Type: kind, Details: {...}`.
    pub fn display_line(&self) -> String {
        format!(
            "[{}] Type: {}, Details: {}",
            self.timestamp, self.kind, self.details
        )
    }
}
