//! Event loop that owns all mutable state of one notification stream.
//!
//! Public calls, socket events and timer expiries all arrive as [`Command`]s
//! on a single inbox and are handled one at a time, so the state machine
//! needs no locks. Timers are spawned tasks that post back into the inbox.

use super::builder::EventCallback;
use super::options::StreamOptions;
use super::state::{ConnectionState, StreamStatus};
use crate::infrastructure::{HeartbeatManager, ReconnectTimer, TimerSlot, rounded_secs};
use crate::sink::LogSink;
use crate::transport::{Socket, SocketEvents, Transport, TransportEvent};
use crate::types::decode_frame;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Connect,
    Dispose,
    Socket { id: u64, event: TransportEvent },
    HeartbeatTick { id: u64 },
    IdleTimeout { id: u64, pongs: u64 },
}

pub(crate) struct StreamDriver {
    options: StreamOptions,
    transport: Arc<dyn Transport>,
    log: Arc<dyn LogSink>,
    on_event: Option<EventCallback>,
    inbox: mpsc::UnboundedSender<Command>,
    status: watch::Sender<StreamStatus>,

    state: ConnectionState,
    socket: Option<Box<dyn Socket>>,
    socket_id: u64,
    pongs: u64,
    reconnect: ReconnectTimer,

    heartbeat_timer: TimerSlot,
    idle_timer: TimerSlot,
    reconnect_timer: TimerSlot,
}

impl StreamDriver {
    pub(crate) fn new(
        options: StreamOptions,
        transport: Arc<dyn Transport>,
        log: Arc<dyn LogSink>,
        on_event: Option<EventCallback>,
        inbox: mpsc::UnboundedSender<Command>,
        status: watch::Sender<StreamStatus>,
    ) -> Self {
        let reconnect =
            ReconnectTimer::new(options.reconnect_base_delay_ms, options.reconnect_max_delay_ms);
        Self {
            options,
            transport,
            log,
            on_event,
            inbox,
            status,
            state: ConnectionState::Closed,
            socket: None,
            socket_id: 0,
            pongs: 0,
            reconnect,
            heartbeat_timer: TimerSlot::new(),
            idle_timer: TimerSlot::new(),
            reconnect_timer: TimerSlot::new(),
        }
    }

    /// Runs until the stream is disposed
    pub(crate) async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Connect => self.connect(),
                Command::Dispose => {
                    self.dispose();
                    break;
                }
                Command::Socket { id, event } => self.handle_socket_event(id, event),
                Command::HeartbeatTick { id } => self.handle_heartbeat_tick(id),
                Command::IdleTimeout { id, pongs } => self.handle_idle_timeout(id, pongs),
            }
        }
        tracing::debug!("Notification stream for {} finished", self.options.url);
    }

    fn connect(&mut self) {
        if !self.state.can_connect() {
            tracing::debug!(
                "Ignoring connect while {:?} ({})",
                self.state,
                self.options.url
            );
            return;
        }

        self.reconnect_timer.clear();
        self.socket_id += 1;
        let id = self.socket_id;

        self.append(&format!("Connecting to {} ...", self.options.url));
        tracing::info!("Connecting to {} (socket {})", self.options.url, id);
        self.set_state(ConnectionState::Connecting);

        let events = SocketEvents::new(id, self.inbox.clone());
        self.socket = Some(self.transport.open(&self.options.url, events));
    }

    fn dispose(&mut self) {
        if self.state == ConnectionState::Disposed {
            return;
        }
        self.stop_heartbeat();
        self.reconnect_timer.clear();

        if let Some(mut socket) = self.socket.take() {
            socket.close();
        }
        self.set_state(ConnectionState::Disposed);
        tracing::info!("Notification stream for {} disposed", self.options.url);
    }

    fn handle_socket_event(&mut self, id: u64, event: TransportEvent) {
        if id != self.socket_id || self.socket.is_none() {
            tracing::trace!("Ignoring {:?} from stale socket {}", event, id);
            return;
        }

        match event {
            TransportEvent::Opened => {
                self.reconnect.reset();
                self.set_state(ConnectionState::Open);
                self.append("Connected.");
                tracing::info!("Connected to {}", self.options.url);
                self.start_heartbeat(id);
            }
            TransportEvent::Message(text) => self.handle_message(&text),
            TransportEvent::Pong => {
                tracing::trace!("Received pong");
                self.pongs += 1;
                self.idle_timer.clear();
            }
            TransportEvent::Error(message) => {
                tracing::warn!("Notification stream error: {}", message);
                self.append(&format!("Error: {}", message));
            }
            TransportEvent::Closed { code, reason } => {
                self.stop_heartbeat();
                self.socket = None;
                self.set_state(ConnectionState::Closed);

                let line = if reason.is_empty() {
                    format!("Disconnected ({}).", code)
                } else {
                    format!("Disconnected ({} {}).", code, reason)
                };
                self.append(&line);
                tracing::info!("Disconnected from {}: code={}", self.options.url, code);

                self.schedule_reconnect();
            }
        }
    }

    fn handle_message(&mut self, text: &str) {
        match decode_frame(text) {
            Ok(frame) => {
                self.append(&frame.line);
                if let (Some(callback), Some(event)) = (&self.on_event, frame.event) {
                    callback(&event);
                }
            }
            Err(e) => {
                tracing::error!("Failed to handle message: {} - Raw: {}", e, text);
                self.append(&format!("Failed to handle message: {}", e));
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        if self.state == ConnectionState::Disposed {
            return;
        }

        let delay = self.reconnect.next_delay();
        self.publish_status();
        self.append(&format!("Reconnecting in {}s...", rounded_secs(delay)));
        tracing::debug!(
            "Reconnect attempt {} scheduled in {:?}",
            self.reconnect.attempts(),
            delay
        );
        self.reconnect_timer.arm(delay, &self.inbox, Command::Connect);
    }

    fn start_heartbeat(&mut self, id: u64) {
        let handle = HeartbeatManager::new()
            .with_interval(self.options.heartbeat_interval())
            .spawn(self.inbox.clone(), Command::HeartbeatTick { id });
        self.heartbeat_timer.set(handle);
    }

    fn stop_heartbeat(&mut self) {
        self.heartbeat_timer.clear();
        self.idle_timer.clear();
    }

    fn handle_heartbeat_tick(&mut self, id: u64) {
        if id != self.socket_id || self.state != ConnectionState::Open {
            return;
        }
        let Some(socket) = self.socket.as_mut() else {
            return;
        };

        socket.ping();
        tracing::debug!("Sent heartbeat ping on socket {}", id);

        // The deadline runs from the oldest unanswered ping
        if !self.idle_timer.is_armed() {
            self.idle_timer.arm(
                self.options.idle_timeout(),
                &self.inbox,
                Command::IdleTimeout {
                    id,
                    pongs: self.pongs,
                },
            );
        }
    }

    fn handle_idle_timeout(&mut self, id: u64, pongs: u64) {
        if id != self.socket_id || self.socket.is_none() {
            return;
        }
        // Answered by a pong that raced the expiry into the inbox
        if pongs != self.pongs {
            tracing::trace!("Ignoring idle timeout answered by a pong");
            return;
        }

        self.append("Heartbeat timeout; forcing reconnect.");
        tracing::warn!("[Heartbeat] Timeout detected on {}", self.options.url);
        if let Some(socket) = self.socket.as_mut() {
            socket.terminate();
        }
    }

    fn append(&self, line: &str) {
        self.log.append_line(line);
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        self.publish_status();
    }

    fn publish_status(&self) {
        self.status.send_replace(StreamStatus {
            state: self.state,
            reconnect_attempts: self.reconnect.attempts(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::transport::mock::MockTransport;

    type Harness = (
        StreamDriver,
        MockTransport,
        MemorySink,
        mpsc::UnboundedReceiver<Command>,
    );

    fn driver() -> Harness {
        let transport = MockTransport::new();
        let sink = MemorySink::new();
        let (inbox, commands) = mpsc::unbounded_channel();
        let (status, _) = watch::channel(StreamStatus::default());
        let driver = StreamDriver::new(
            StreamOptions::new("ws://localhost:8016/ws"),
            Arc::new(transport.clone()),
            Arc::new(sink.clone()),
            None,
            inbox,
            status,
        );
        (driver, transport, sink, commands)
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_queued_behind_pong_is_ignored() {
        let (mut driver, transport, sink, _commands) = driver();
        driver.connect();
        driver.handle_socket_event(1, TransportEvent::Opened);
        driver.handle_heartbeat_tick(1);
        assert_eq!(transport.socket(0).pings(), 1);

        // Expiry already posted when the pong is handled
        let pongs = driver.pongs;
        driver.handle_socket_event(1, TransportEvent::Pong);
        driver.handle_idle_timeout(1, pongs);

        assert!(!transport.socket(0).is_terminated());
        assert!(!sink.lines().iter().any(|l| l.starts_with("Heartbeat timeout")));
        assert_eq!(driver.state, ConnectionState::Open);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_without_pong_terminates() {
        let (mut driver, transport, sink, _commands) = driver();
        driver.connect();
        driver.handle_socket_event(1, TransportEvent::Opened);
        driver.handle_heartbeat_tick(1);

        driver.handle_idle_timeout(1, driver.pongs);

        assert!(transport.socket(0).is_terminated());
        assert_eq!(
            sink.lines().last().map(String::as_str),
            Some("Heartbeat timeout; forcing reconnect.")
        );
    }
}
