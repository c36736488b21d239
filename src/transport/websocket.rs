use super::{Socket, SocketEvents, Transport};
use crate::types::{StreamError, WS_CLOSE_ABNORMAL, WS_CLOSE_NO_STATUS, WS_CLOSE_NORMAL};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketCommand {
    Ping,
    Close,
    Terminate,
}

/// Production transport built on tokio-tungstenite.
///
/// Each socket runs in its own task; the returned handle talks to it over a
/// command channel. Dropping the handle terminates the socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    fn open(&self, url: &str, events: SocketEvents) -> Box<dyn Socket> {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_socket(url.to_string(), events, commands_rx));
        Box::new(WebSocketHandle {
            commands: commands_tx,
        })
    }
}

/// Command side of a socket task
pub struct WebSocketHandle {
    commands: mpsc::UnboundedSender<SocketCommand>,
}

impl WebSocketHandle {
    fn send(&self, command: SocketCommand) {
        // Socket task already finished; nothing left to do
        let _ = self.commands.send(command);
    }
}

impl Socket for WebSocketHandle {
    fn ping(&mut self) {
        self.send(SocketCommand::Ping);
    }

    fn close(&mut self) {
        self.send(SocketCommand::Close);
    }

    fn terminate(&mut self) {
        self.send(SocketCommand::Terminate);
    }
}

async fn run_socket(
    url: String,
    events: SocketEvents,
    mut commands: mpsc::UnboundedReceiver<SocketCommand>,
) {
    let ws_stream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((stream, _response)) => stream,
            Err(e) => {
                tracing::warn!("WebSocket connect to {} failed: {}", url, e);
                events.error(StreamError::from(e).to_string());
                events.closed(WS_CLOSE_ABNORMAL, "");
                return;
            }
        },
        command = commands.recv() => {
            tracing::debug!("Connect to {} abandoned ({:?})", url, command);
            events.closed(WS_CLOSE_ABNORMAL, "");
            return;
        }
    };

    tracing::debug!("WebSocket handshake with {} complete", url);
    events.opened();

    let (mut write_half, mut read_half) = ws_stream.split();
    let mut close_code = WS_CLOSE_ABNORMAL;
    let mut close_reason = String::new();

    loop {
        tokio::select! {
            frame = read_half.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    tracing::debug!("Received text message: {}", text.as_str());
                    events.message(text.as_str());
                }
                Some(Ok(Message::Binary(data))) => {
                    tracing::debug!("Received binary message ({} bytes)", data.len());
                    events.message(String::from_utf8_lossy(&data).into_owned());
                }
                Some(Ok(Message::Pong(_))) => events.pong(),
                Some(Ok(Message::Ping(data))) => {
                    tracing::debug!("Received ping ({} bytes)", data.len());
                }
                Some(Ok(Message::Close(frame))) => {
                    match frame {
                        Some(close_frame) => {
                            close_code = u16::from(close_frame.code);
                            close_reason = close_frame.reason.as_str().to_owned();
                        }
                        None => close_code = WS_CLOSE_NO_STATUS,
                    }
                    tracing::debug!("Server closed connection: code={}", close_code);
                }
                Some(Ok(Message::Frame(_))) => {
                    tracing::debug!("Received raw frame (internal)");
                }
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => break,
                Some(Err(e)) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    events.error(StreamError::from(e).to_string());
                    close_code = WS_CLOSE_ABNORMAL;
                    break;
                }
            },
            command = commands.recv() => match command {
                Some(SocketCommand::Ping) => {
                    if let Err(e) = write_half.send(Message::Ping(Vec::<u8>::new().into())).await {
                        tracing::warn!("Failed to send ping: {}", e);
                        events.error(StreamError::from(e).to_string());
                    }
                }
                Some(SocketCommand::Close) => {
                    if let Err(e) = write_half.close().await {
                        tracing::debug!("Close handshake failed: {}", e);
                    }
                    close_code = WS_CLOSE_NORMAL;
                    break;
                }
                Some(SocketCommand::Terminate) | None => {
                    tracing::debug!("Terminating connection to {}", url);
                    close_code = WS_CLOSE_ABNORMAL;
                    break;
                }
            }
        }
    }

    events.closed(close_code, close_reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::driver::Command;
    use crate::transport::TransportEvent;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_endpoint_reports_error_then_close() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = SocketEvents::new(1, tx);
        // Port 9 (discard) on loopback is almost never listening
        let _socket = WebSocketTransport::new().open("ws://127.0.0.1:9/ws", events);

        let first = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        match first {
            Command::Socket {
                id: 1,
                event: TransportEvent::Error(message),
            } => assert!(message.starts_with("WebSocket error:"), "{}", message),
            other => panic!("expected error event, got {:?}", other),
        }

        let second = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            second,
            Command::Socket {
                id: 1,
                event: TransportEvent::Closed {
                    code: WS_CLOSE_ABNORMAL,
                    reason: String::new()
                }
            }
        );
    }

    #[tokio::test]
    async fn test_dropping_handle_abandons_connect() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let events = SocketEvents::new(4, tx);
        let socket = WebSocketTransport::new().open("ws://10.255.255.1:8016/ws", events);
        drop(socket);

        let event = tokio::time::timeout(Duration::from_secs(10), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(
            event,
            Command::Socket {
                id: 4,
                event: TransportEvent::Error(_) | TransportEvent::Closed { .. }
            }
        ));
    }
}
