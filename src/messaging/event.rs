use crate::types::constants::forward_kinds;
use serde::{Deserialize, Serialize};

/// Kind tag of a message forwarded to UI-facing consumers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForwardKind {
    /// Every inbound record, unchanged
    #[serde(rename = "notification")]
    Notification,

    /// Progress of a discovery run step
    #[serde(rename = "discovery.step")]
    Step,
}

impl ForwardKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Notification => forward_kinds::NOTIFICATION,
            Self::Step => forward_kinds::STEP,
        }
    }
}

impl std::fmt::Display for ForwardKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Message handed to the UI layer, serialized as `{"type": ..., "payload": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardedMessage {
    #[serde(rename = "type")]
    pub kind: ForwardKind,
    pub payload: serde_json::Value,
}

impl ForwardedMessage {
    pub fn new(kind: ForwardKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_forwarded_message_wire_shape() {
        let message = ForwardedMessage::new(ForwardKind::Step, json!({"step": "scan"}));
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "discovery.step", "payload": {"step": "scan"}})
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ForwardKind::Notification.to_string(), "notification");
        assert_eq!(ForwardKind::Step.to_string(), "discovery.step");
    }
}
