//! # Raina notification stream
//!
//! A reconnecting websocket client for the Raina notification endpoint.
//! It keeps one connection open, reconnects with exponential backoff and
//! jitter, runs a ping/pong heartbeat with an idle timeout, and turns every
//! inbound frame into a log line plus a structured event.
//!
//! ## Example
//!
//! ```no_run
//! use raina_stream::{NotificationStream, StreamOptions, TracingSink};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stream = NotificationStream::builder(StreamOptions::from_env()?)
//!         .log_sink(TracingSink::default())
//!         .on_event(|event| println!("{:?}", event.name()))
//!         .build()?;
//!
//!     tokio::signal::ctrl_c().await?;
//!     stream.dispose();
//!     stream.closed().await;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod infrastructure;
pub mod messaging;
pub mod sink;
pub mod stream;
pub mod transport;
pub mod types;

pub use context::StreamContext;
pub use messaging::{EventRouter, ForwardKind, ForwardedMessage};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use stream::{
    ConnectionState, EventCallback, NotificationStream, NotificationStreamBuilder, StreamOptions,
    StreamStatus,
};
pub use transport::{Socket, SocketEvents, Transport, TransportEvent, WebSocketTransport};
pub use types::{Result, StreamError, StreamEvent};
