use crate::types::constants::{FALLBACK_EVENT_NAME, FALLBACK_LEVEL, record_fields};
use crate::types::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured record received on the notification stream.
///
/// Holds the full JSON object exactly as it arrived so that consumers can
/// route on any field, not only the ones used for the log line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamEvent {
    record: Map<String, Value>,
}

impl StreamEvent {
    pub fn new(record: Map<String, Value>) -> Self {
        Self { record }
    }

    /// Returns a field of the record
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// Returns a field of the record when it is a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.record.get(key).and_then(Value::as_str)
    }

    /// Event name (`event`, else `type`), if the record carries one
    pub fn name(&self) -> Option<String> {
        truthy_text(&self.record, record_fields::EVENT)
            .or_else(|| truthy_text(&self.record, record_fields::TYPE))
    }

    /// Inner data envelope, when present and not null
    pub fn data(&self) -> Option<&Value> {
        self.record
            .get(record_fields::DATA)
            .filter(|value| !value.is_null())
    }

    pub fn record(&self) -> &Map<String, Value> {
        &self.record
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.record)
    }
}

impl From<Map<String, Value>> for StreamEvent {
    fn from(record: Map<String, Value>) -> Self {
        Self::new(record)
    }
}

/// Result of decoding one inbound frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    /// Line to append to the log sink
    pub line: String,
    /// Structured record, absent when the payload was not a JSON object
    pub event: Option<StreamEvent>,
}

/// Decodes an inbound text frame into a log line and, when the payload is a
/// JSON object, the structured event.
///
/// Payloads that are not JSON objects are passed through unchanged as the
/// log line.
pub fn decode_frame(text: &str) -> Result<DecodedFrame> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(record)) => {
            let line = normalize_record(&record)?;
            Ok(DecodedFrame {
                line,
                event: Some(StreamEvent::new(record)),
            })
        }
        _ => Ok(DecodedFrame {
            line: text.to_string(),
            event: None,
        }),
    }
}

/// Renders a record as `[LEVEL] event: message {residual}`.
pub fn normalize_record(record: &Map<String, Value>) -> Result<String> {
    let event = truthy_text(record, record_fields::EVENT)
        .or_else(|| truthy_text(record, record_fields::TYPE))
        .unwrap_or_else(|| FALLBACK_EVENT_NAME.to_string());

    let level = truthy_text(record, record_fields::LEVEL)
        .or_else(|| truthy_text(record, record_fields::SEVERITY))
        .unwrap_or_else(|| FALLBACK_LEVEL.to_string())
        .to_uppercase();

    let message = truthy_text(record, record_fields::MESSAGE)
        .or_else(|| truthy_text(record, record_fields::TEXT))
        .or_else(|| truthy_text(record, record_fields::DETAIL))
        .unwrap_or_default();

    let residual: Map<String, Value> = record
        .iter()
        .filter(|(key, _)| !record_fields::CONSUMED.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    let mut line = format!("[{}] {}: {}", level, event, message);
    if !residual.is_empty() {
        line.push(' ');
        line.push_str(&serde_json::to_string(&residual)?);
    }
    Ok(line)
}

/// Reads a field as display text, skipping empty and falsy values.
fn truthy_text(record: &Map<String, Value>, key: &str) -> Option<String> {
    match record.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some("true".to_string()),
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
