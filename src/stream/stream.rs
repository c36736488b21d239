use super::builder::NotificationStreamBuilder;
use super::driver::Command;
use super::options::StreamOptions;
use super::state::{ConnectionState, StreamStatus};
use crate::types::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, watch};

/// Best-effort persistent connection to one notification endpoint.
///
/// `NotificationStream` keeps a websocket open to the configured URL,
/// reconnects with exponential backoff and jitter after every close, pings
/// the peer on a fixed interval and forces a reconnect when pongs stop
/// arriving. Every inbound frame is normalized into a log line for the log
/// sink and, when it is a JSON object, handed to the event callback.
///
/// The handle never returns errors once built: failures are reported as log
/// lines. Calls made after [`dispose()`](Self::dispose) are ignored.
///
/// # Example
///
/// ```no_run
/// use raina_stream::{MemorySink, NotificationStream, StreamOptions};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = MemorySink::new();
/// let stream = NotificationStream::builder(StreamOptions::new("ws://localhost:8016/ws"))
///     .log_sink(sink.clone())
///     .on_event(|event| println!("{:?}", event.name()))
///     .build()?;
///
/// // ... later, on shutdown
/// stream.dispose();
/// stream.closed().await;
/// # Ok(())
/// # }
/// ```
pub struct NotificationStream {
    options: StreamOptions,
    commands: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<StreamStatus>,
    disposed: AtomicBool,
}

impl NotificationStream {
    /// Creates a stream with the websocket transport and the tracing log
    /// sink. Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the options fail validation or no tokio runtime
    /// is running.
    pub fn new(options: StreamOptions) -> Result<Self> {
        NotificationStreamBuilder::new(options).build()
    }

    pub fn builder(options: StreamOptions) -> NotificationStreamBuilder {
        NotificationStreamBuilder::new(options)
    }

    pub(crate) fn new_internal(
        options: StreamOptions,
        commands: mpsc::UnboundedSender<Command>,
        status: watch::Receiver<StreamStatus>,
    ) -> Self {
        Self {
            options,
            commands,
            status,
            disposed: AtomicBool::new(false),
        }
    }

    /// Opens a connection unless one is already open or connecting.
    ///
    /// No-op after [`dispose()`](Self::dispose).
    pub fn connect(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        // Driver gone means the stream is disposed
        let _ = self.commands.send(Command::Connect);
    }

    /// Closes the connection and cancels every pending timer. Idempotent
    /// and final.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let _ = self.commands.send(Command::Dispose);
    }

    /// Resolves once the stream has finished disposing
    pub async fn closed(&self) {
        let mut status = self.status.clone();
        let _ = status
            .wait_for(|status| status.state == ConnectionState::Disposed)
            .await;
    }

    /// Current state and reconnect attempt count
    pub fn status(&self) -> StreamStatus {
        *self.status.borrow()
    }

    /// Receiver notified on every state transition
    pub fn subscribe_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.status().state == ConnectionState::Open
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    pub fn url(&self) -> &str {
        &self.options.url
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for NotificationStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationStream")
            .field("url", &self.options.url)
            .field("status", &self.status())
            .finish()
    }
}
