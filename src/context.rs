//! Application-level owner of the notification stream.

use crate::sink::LogSink;
use crate::stream::builder::ensure_runtime;
use crate::stream::{EventCallback, NotificationStream, StreamOptions};
use crate::transport::{Transport, WebSocketTransport};
use crate::types::Result;
use std::sync::Arc;

/// Holds at most one live [`NotificationStream`].
///
/// Streams are never reconfigured in place: when the settings change, the
/// context disposes the current stream and builds a fresh one.
pub struct StreamContext {
    transport: Arc<dyn Transport>,
    log_sink: Arc<dyn LogSink>,
    on_event: Option<EventCallback>,
    stream: Option<NotificationStream>,
}

impl StreamContext {
    pub fn new(transport: Arc<dyn Transport>, log_sink: Arc<dyn LogSink>) -> Self {
        Self {
            transport,
            log_sink,
            on_event: None,
            stream: None,
        }
    }

    /// Context using the websocket transport
    pub fn with_websocket(log_sink: Arc<dyn LogSink>) -> Self {
        Self::new(Arc::new(WebSocketTransport::new()), log_sink)
    }

    /// Callback for streams built from now on
    pub fn set_event_callback(&mut self, callback: EventCallback) {
        self.on_event = Some(callback);
    }

    /// Applies new settings.
    ///
    /// Builds a stream if none is live, replaces the live stream if the
    /// options differ, and does nothing if they are identical. Returns
    /// whether a new stream was built.
    ///
    /// # Errors
    ///
    /// Invalid options, or a call from outside a tokio runtime, are
    /// rejected before the live stream is touched.
    pub fn configure(&mut self, options: StreamOptions) -> Result<bool> {
        options.validate()?;
        ensure_runtime()?;

        if let Some(current) = &self.stream
            && current.options() == &options
        {
            return Ok(false);
        }

        if let Some(previous) = self.stream.take() {
            tracing::info!(
                "Replacing notification stream {} -> {}",
                previous.url(),
                options.url
            );
            previous.dispose();
        }

        let mut builder = NotificationStream::builder(options)
            .shared_transport(Arc::clone(&self.transport))
            .shared_log_sink(Arc::clone(&self.log_sink));
        if let Some(callback) = &self.on_event {
            builder = builder.shared_on_event(Arc::clone(callback));
        }
        self.stream = Some(builder.build()?);
        Ok(true)
    }

    /// The live stream, if any
    pub fn current(&self) -> Option<&NotificationStream> {
        self.stream.as_ref()
    }

    /// Disposes the live stream
    pub fn shutdown(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.dispose();
        }
    }
}

impl Drop for StreamContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::{EventRouter, ForwardKind};
    use crate::sink::MemorySink;
    use crate::stream::ConnectionState;
    use crate::transport::mock::MockTransport;
    use tokio::sync::mpsc;

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    fn context() -> (StreamContext, MockTransport, MemorySink) {
        let transport = MockTransport::new();
        let sink = MemorySink::new();
        let context = StreamContext::new(Arc::new(transport.clone()), Arc::new(sink.clone()));
        (context, transport, sink)
    }

    #[test]
    fn test_configure_outside_runtime_is_an_error() {
        let (mut context, transport, _sink) = context();
        let result = context.configure(StreamOptions::new("ws://localhost:8016/ws"));

        assert!(matches!(result, Err(crate::types::StreamError::Config(_))));
        assert!(context.current().is_none());
        assert_eq!(transport.opened(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_url_change_replaces_stream() {
        let (mut context, transport, sink) = context();
        assert!(context.configure(StreamOptions::new("ws://localhost:8016/ws")).unwrap());
        settle().await;
        let first = transport.socket(0);
        first.open();
        settle().await;

        assert!(context.configure(StreamOptions::new("ws://remote:9000/ws")).unwrap());
        settle().await;

        assert!(first.is_closed());
        assert_eq!(transport.opened(), 2);
        assert_eq!(transport.socket(1).url, "ws://remote:9000/ws");
        assert_eq!(context.current().map(|s| s.url()), Some("ws://remote:9000/ws"));
        assert_eq!(
            sink.lines().last().map(String::as_str),
            Some("Connecting to ws://remote:9000/ws ...")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_options_keep_stream() {
        let (mut context, transport, _sink) = context();
        let options = StreamOptions::new("ws://localhost:8016/ws");
        assert!(context.configure(options.clone()).unwrap());
        assert!(!context.configure(options).unwrap());
        settle().await;

        assert_eq!(transport.opened(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_options_keep_current_stream() {
        let (mut context, transport, _sink) = context();
        context
            .configure(StreamOptions::new("ws://localhost:8016/ws"))
            .unwrap();
        settle().await;

        assert!(context.configure(StreamOptions::new("ftp://nope")).is_err());
        settle().await;
        assert!(!transport.socket(0).is_closed());
        assert!(context.current().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_disposes_stream() {
        let (mut context, transport, _sink) = context();
        context
            .configure(StreamOptions::new("ws://localhost:8016/ws"))
            .unwrap();
        settle().await;
        let mut status = context.current().unwrap().subscribe_status();

        context.shutdown();
        status
            .wait_for(|s| s.state == ConnectionState::Disposed)
            .await
            .unwrap();
        assert!(context.current().is_none());
        assert!(transport.socket(0).is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_reaches_router() {
        let (mut context, transport, _sink) = context();
        let (tx, mut rx) = mpsc::unbounded_channel();
        context.set_event_callback(EventRouter::new().into_channel(tx));
        context
            .configure(StreamOptions::new("ws://localhost:8016/ws"))
            .unwrap();
        settle().await;

        let socket = transport.socket(0);
        socket.open();
        socket.message(r#"{"event":"discovery.step.completed","data":{"step":"scan"}}"#);
        settle().await;

        assert_eq!(rx.recv().await.unwrap().kind, ForwardKind::Notification);
        let step = rx.recv().await.unwrap();
        assert_eq!(step.kind, ForwardKind::Step);
        assert_eq!(step.payload["step"], "scan");
    }
}
