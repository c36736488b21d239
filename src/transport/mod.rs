//! Transport seam between the stream's event loop and the network.
//!
//! A [`Transport`] opens sockets; each [`Socket`] reports its lifecycle back
//! through the [`SocketEvents`] handle it was opened with. Opening is
//! asynchronous: `open` returns immediately and the outcome arrives later as
//! `opened` or `closed`.

#[cfg(test)]
pub(crate) mod mock;
pub mod websocket;

pub use websocket::WebSocketTransport;

use crate::stream::driver::Command;
use tokio::sync::mpsc;

/// Lifecycle and data events reported by a socket
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Pong,
    Error(String),
    Closed { code: u16, reason: String },
}

/// Opens outbound connections for a notification stream.
pub trait Transport: Send + Sync + 'static {
    /// Starts opening a connection to `url`.
    ///
    /// Implementations must eventually report `closed` on `events` after a
    /// failed open, after the peer goes away and after [`Socket::terminate`].
    fn open(&self, url: &str, events: SocketEvents) -> Box<dyn Socket>;
}

/// Handle to one connection. All operations are fire-and-forget.
pub trait Socket: Send {
    /// Sends a protocol-level ping
    fn ping(&mut self);

    /// Closes the connection gracefully
    fn close(&mut self);

    /// Drops the connection without a closing handshake
    fn terminate(&mut self);
}

/// Reporting handle given to a transport for one socket.
///
/// Events are tagged with the socket they belong to; the stream ignores
/// events from sockets it has already moved past.
#[derive(Debug, Clone)]
pub struct SocketEvents {
    socket_id: u64,
    inbox: mpsc::UnboundedSender<Command>,
}

impl SocketEvents {
    pub(crate) fn new(socket_id: u64, inbox: mpsc::UnboundedSender<Command>) -> Self {
        Self { socket_id, inbox }
    }

    pub fn socket_id(&self) -> u64 {
        self.socket_id
    }

    pub fn opened(&self) {
        self.emit(TransportEvent::Opened);
    }

    pub fn message(&self, text: impl Into<String>) {
        self.emit(TransportEvent::Message(text.into()));
    }

    pub fn pong(&self) {
        self.emit(TransportEvent::Pong);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(TransportEvent::Error(message.into()));
    }

    pub fn closed(&self, code: u16, reason: impl Into<String>) {
        self.emit(TransportEvent::Closed {
            code,
            reason: reason.into(),
        });
    }

    /// Reports an event; silently dropped once the stream is disposed
    pub fn emit(&self, event: TransportEvent) {
        let command = Command::Socket {
            id: self.socket_id,
            event,
        };
        if self.inbox.send(command).is_err() {
            tracing::trace!(
                "Stream gone, dropping event from socket {}",
                self.socket_id
            );
        }
    }
}
