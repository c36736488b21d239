use super::driver::StreamDriver;
use super::options::StreamOptions;
use super::state::StreamStatus;
use super::stream::NotificationStream;
use crate::sink::{LogSink, TracingSink};
use crate::transport::{Transport, WebSocketTransport};
use crate::types::{Result, StreamError, StreamEvent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Callback receiving every structured record, invoked synchronously from
/// the message path.
pub type EventCallback = Arc<dyn Fn(&StreamEvent) + Send + Sync>;

/// Fails unless called from within a tokio runtime
pub(crate) fn ensure_runtime() -> Result<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|e| StreamError::Config(format!("notification stream needs a tokio runtime: {}", e)))
}

/// Builder for NotificationStream that handles initialization
pub struct NotificationStreamBuilder {
    options: StreamOptions,
    transport: Option<Arc<dyn Transport>>,
    log_sink: Option<Arc<dyn LogSink>>,
    on_event: Option<EventCallback>,
}

impl NotificationStreamBuilder {
    pub fn new(options: StreamOptions) -> Self {
        Self {
            options,
            transport: None,
            log_sink: None,
            on_event: None,
        }
    }

    /// Transport used to open sockets (default: [`WebSocketTransport`])
    pub fn transport(self, transport: impl Transport) -> Self {
        self.shared_transport(Arc::new(transport))
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sink receiving the log lines (default: [`TracingSink`])
    pub fn log_sink(self, sink: impl LogSink + 'static) -> Self {
        self.shared_log_sink(Arc::new(sink))
    }

    pub fn shared_log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Callback receiving every structured record
    pub fn on_event<F>(self, callback: F) -> Self
    where
        F: Fn(&StreamEvent) + Send + Sync + 'static,
    {
        self.shared_on_event(Arc::new(callback))
    }

    pub fn shared_on_event(mut self, callback: EventCallback) -> Self {
        self.on_event = Some(callback);
        self
    }

    /// Validates the options and spawns the stream's event loop.
    ///
    /// Must be called from within a tokio runtime. When `auto_start` is set
    /// the first connection attempt is issued immediately; its outcome is
    /// reported through the log sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail [`StreamOptions::validate`] or
    /// no tokio runtime is running on the current thread.
    pub fn build(self) -> Result<NotificationStream> {
        self.options.validate()?;
        ensure_runtime()?;

        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(WebSocketTransport::new()));
        let log_sink = self
            .log_sink
            .unwrap_or_else(|| Arc::new(TracingSink::default()));

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(StreamStatus::default());

        let driver = StreamDriver::new(
            self.options.clone(),
            transport,
            log_sink,
            self.on_event,
            commands_tx.clone(),
            status_tx,
        );
        tokio::spawn(driver.run(commands_rx));

        let stream = NotificationStream::new_internal(self.options, commands_tx, status_rx);
        if stream.options().auto_start {
            stream.connect();
        }
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn test_build_outside_runtime_is_an_error() {
        let result = NotificationStreamBuilder::new(StreamOptions::default())
            .transport(MockTransport::new())
            .build();
        assert!(matches!(result, Err(StreamError::Config(msg)) if msg.contains("tokio runtime")));
    }

    #[tokio::test]
    async fn test_build_inside_runtime_succeeds() {
        let stream = NotificationStreamBuilder::new(StreamOptions::default().with_auto_start(false))
            .transport(MockTransport::new())
            .build()
            .unwrap();
        stream.dispose();
        stream.closed().await;
    }
}
