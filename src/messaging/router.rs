use super::event::{ForwardKind, ForwardedMessage};
use crate::stream::EventCallback;
use crate::types::constants::{STEP_SEGMENT, record_fields};
use crate::types::StreamEvent;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Routes stream events to UI-facing messages.
///
/// Every event is forwarded as a notification. Events whose routing key
/// contains the step segment (e.g. `discovery.step.completed`) are also
/// forwarded as a step message carrying the inner `data` envelope when the
/// event has one.
#[derive(Debug, Clone)]
pub struct EventRouter {
    step_segment: String,
}

impl EventRouter {
    pub fn new() -> Self {
        Self {
            step_segment: STEP_SEGMENT.to_string(),
        }
    }

    pub fn with_step_segment(mut self, segment: impl Into<String>) -> Self {
        self.step_segment = segment.into();
        self
    }

    /// Routing key: `routing_key`, else `event`, else `type`
    pub fn routing_key<'a>(&self, event: &'a StreamEvent) -> Option<&'a str> {
        [
            record_fields::ROUTING_KEY,
            record_fields::EVENT,
            record_fields::TYPE,
        ]
        .into_iter()
        .find_map(|field| event.get_str(field).filter(|key| !key.is_empty()))
    }

    pub fn is_step_key(&self, key: &str) -> bool {
        key.split('.').any(|segment| segment == self.step_segment)
    }

    /// Messages to forward for one event, notification first
    pub fn route(&self, event: &StreamEvent) -> Vec<ForwardedMessage> {
        let mut messages = vec![ForwardedMessage::new(
            ForwardKind::Notification,
            event.clone().into_value(),
        )];

        if let Some(key) = self.routing_key(event)
            && self.is_step_key(key)
        {
            let payload = event
                .data()
                .cloned()
                .unwrap_or_else(|| event.clone().into_value());
            tracing::debug!("Routing step event {}", key);
            messages.push(ForwardedMessage::new(ForwardKind::Step, payload));
        }

        messages
    }

    /// Event callback that routes every event and hands the results to `forward`
    pub fn into_callback<F>(self, forward: F) -> EventCallback
    where
        F: Fn(ForwardedMessage) + Send + Sync + 'static,
    {
        Arc::new(move |event: &StreamEvent| {
            for message in self.route(event) {
                forward(message);
            }
        })
    }

    /// Event callback that sends routed messages into a channel
    pub fn into_channel(self, sender: mpsc::UnboundedSender<ForwardedMessage>) -> EventCallback {
        self.into_callback(move |message| {
            if sender.send(message).is_err() {
                tracing::debug!("Forwarding receiver dropped, discarding message");
            }
        })
    }
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn event(value: Value) -> StreamEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plain_event_forwards_notification_only() {
        let router = EventRouter::new();
        let messages = router.route(&event(json!({"event": "workspace.updated", "id": "w1"})));

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, ForwardKind::Notification);
        assert_eq!(
            messages[0].payload,
            json!({"event": "workspace.updated", "id": "w1"})
        );
    }

    #[test]
    fn test_step_event_forwards_data_envelope() {
        let router = EventRouter::new();
        let messages = router.route(&event(json!({
            "routing_key": "discovery.step.completed",
            "event": "ignored",
            "data": {"run_id": "r1", "step": "inventory"}
        })));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].kind, ForwardKind::Step);
        assert_eq!(messages[1].payload, json!({"run_id": "r1", "step": "inventory"}));
    }

    #[test]
    fn test_step_event_without_data_forwards_record() {
        let router = EventRouter::new();
        let record = json!({"event": "discovery.step.started", "run_id": "r1"});
        let messages = router.route(&event(record.clone()));

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].payload, record);
    }

    #[test]
    fn test_step_segment_must_match_whole_segment() {
        let router = EventRouter::new();
        assert!(router.is_step_key("discovery.step.failed"));
        assert!(router.is_step_key("step"));
        assert!(!router.is_step_key("discovery.steps.failed"));
        assert!(!router.is_step_key("footstep"));

        let custom = EventRouter::new().with_step_segment("stage");
        assert!(custom.is_step_key("pack.stage.done"));
    }

    #[test]
    fn test_routing_key_falls_back_to_type() {
        let router = EventRouter::new();
        let ev = event(json!({"routing_key": "", "type": "run.step.queued"}));
        assert_eq!(router.routing_key(&ev), Some("run.step.queued"));
    }

    #[test]
    fn test_channel_callback_forwards_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let callback = EventRouter::new().into_channel(tx);
        callback(&event(json!({"event": "discovery.step.started", "data": {"n": 1}})));

        assert_eq!(rx.try_recv().unwrap().kind, ForwardKind::Notification);
        assert_eq!(rx.try_recv().unwrap().payload, json!({"n": 1}));
        assert!(rx.try_recv().is_err());
    }
}
