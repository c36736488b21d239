//! In-memory transport driven by tests.

use super::{Socket, SocketEvents, Transport};
use crate::types::WS_CLOSE_ABNORMAL;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct SocketRecord {
    pings: usize,
    closed: bool,
    terminated: bool,
}

/// Records every socket the stream opens and lets the test play the peer.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    sockets: Arc<Mutex<Vec<MockSocket>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sockets opened so far
    pub fn opened(&self) -> usize {
        self.sockets.lock().unwrap().len()
    }

    pub fn socket(&self, index: usize) -> MockSocket {
        self.sockets.lock().unwrap()[index].clone()
    }
}

impl Transport for MockTransport {
    fn open(&self, url: &str, events: SocketEvents) -> Box<dyn Socket> {
        let record = Arc::new(Mutex::new(SocketRecord::default()));
        self.sockets.lock().unwrap().push(MockSocket {
            url: url.to_string(),
            events: events.clone(),
            record: Arc::clone(&record),
        });
        Box::new(MockHandle { events, record })
    }
}

/// Test-side view of one opened socket
#[derive(Clone)]
pub(crate) struct MockSocket {
    pub url: String,
    events: SocketEvents,
    record: Arc<Mutex<SocketRecord>>,
}

impl MockSocket {
    pub fn open(&self) {
        self.events.opened();
    }

    pub fn message(&self, text: &str) {
        self.events.message(text);
    }

    pub fn pong(&self) {
        self.events.pong();
    }

    pub fn error(&self, message: &str) {
        self.events.error(message);
    }

    pub fn close(&self, code: u16, reason: &str) {
        self.events.closed(code, reason);
    }

    pub fn pings(&self) -> usize {
        self.record.lock().unwrap().pings
    }

    pub fn is_closed(&self) -> bool {
        self.record.lock().unwrap().closed
    }

    pub fn is_terminated(&self) -> bool {
        self.record.lock().unwrap().terminated
    }
}

struct MockHandle {
    events: SocketEvents,
    record: Arc<Mutex<SocketRecord>>,
}

impl Socket for MockHandle {
    fn ping(&mut self) {
        self.record.lock().unwrap().pings += 1;
    }

    fn close(&mut self) {
        self.record.lock().unwrap().closed = true;
    }

    fn terminate(&mut self) {
        self.record.lock().unwrap().terminated = true;
        // A real socket reports the abrupt close back to the stream
        self.events.closed(WS_CLOSE_ABNORMAL, "");
    }
}
