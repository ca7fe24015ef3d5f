//! Decoding of server-sent events into typed items.

use eventsource_stream::Event;

use farmwatch_types::{parse_value, AlertEntry, MetricId, SamplePoint};

/// Event name the backend sends once a subscription is established.
pub const CONNECT_EVENT: &str = "connect";

/// Event name of unnamed server-sent events.
pub const MESSAGE_EVENT: &str = "message";

/// Outcome of decoding one server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// A valid item for this channel.
    Item(T),
    /// The server's connection acknowledgement.
    Connect,
    /// An event this channel does not listen for.
    Ignored,
    /// An event this channel listens for whose payload is unusable.
    Malformed(String),
}

/// Turns raw events of one subscription into typed items.
pub trait Decode: Send + 'static {
    type Item: Send + 'static;

    fn decode(&self, event: &Event) -> Decoded<Self::Item>;
}

/// Decodes `<metric>_data` events carrying a bare numeric payload.
///
/// Points are stamped with the wall-clock time of arrival.
#[derive(Debug, Clone, Copy)]
pub struct SensorDecoder {
    metric: MetricId,
}

impl SensorDecoder {
    pub fn new(metric: MetricId) -> Self {
        Self { metric }
    }
}

impl Decode for SensorDecoder {
    type Item = SamplePoint;

    fn decode(&self, event: &Event) -> Decoded<SamplePoint> {
        if event.event == self.metric.event_name() {
            match parse_value(&event.data) {
                Some(value) => Decoded::Item(SamplePoint::now(value)),
                None => Decoded::Malformed(format!("not a finite number: {:?}", event.data)),
            }
        } else if event.event == CONNECT_EVENT {
            Decoded::Connect
        } else {
            Decoded::Ignored
        }
    }
}

/// Decodes generic message events carrying a JSON alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertDecoder;

impl Decode for AlertDecoder {
    type Item = AlertEntry;

    fn decode(&self, event: &Event) -> Decoded<AlertEntry> {
        match event.event.as_str() {
            "" | MESSAGE_EVENT => match AlertEntry::from_json(&event.data) {
                Ok(alert) => Decoded::Item(alert),
                Err(e) => Decoded::Malformed(format!("invalid alert data: {}", e)),
            },
            CONNECT_EVENT => Decoded::Connect,
            _ => Decoded::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, data: &str) -> Event {
        Event {
            event: name.to_string(),
            data: data.to_string(),
            id: String::new(),
            retry: None,
        }
    }

    #[test]
    fn test_sensor_decodes_own_event() {
        let decoder = SensorDecoder::new(MetricId::Humidity);
        match decoder.decode(&event("humidity_data", "55.5")) {
            Decoded::Item(point) => assert_eq!(point.value, 55.5),
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_sensor_rejects_garbage() {
        let decoder = SensorDecoder::new(MetricId::Temperature);
        assert!(matches!(
            decoder.decode(&event("temperature_data", "warm")),
            Decoded::Malformed(_)
        ));
        assert!(matches!(
            decoder.decode(&event("temperature_data", "NaN")),
            Decoded::Malformed(_)
        ));
    }

    #[test]
    fn test_sensor_ignores_other_metrics() {
        let decoder = SensorDecoder::new(MetricId::SoilMoisture);
        assert_eq!(decoder.decode(&event("humidity_data", "1")), Decoded::Ignored);
        assert_eq!(decoder.decode(&event("message", "1")), Decoded::Ignored);
        assert_eq!(decoder.decode(&event("connect", "ok")), Decoded::Connect);
    }

    #[test]
    fn test_alert_decodes_message() {
        let decoder = AlertDecoder;
        let decoded = decoder.decode(&event(
            "message",
            r#"{"timestamp":"t","type":"PORT_SCAN","details":{"port":22}}"#,
        ));
        match decoded {
            Decoded::Item(alert) => {
                assert_eq!(alert.kind, "PORT_SCAN");
                assert_eq!(alert.details["port"], 22);
            }
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_alert_malformed() {
        let decoder = AlertDecoder;
        assert!(matches!(
            decoder.decode(&event("message", "{broken")),
            Decoded::Malformed(_)
        ));
        assert_eq!(decoder.decode(&event("heartbeat", "{}")), Decoded::Ignored);
    }
}
