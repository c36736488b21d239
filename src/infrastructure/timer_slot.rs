use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Holds at most one pending background timer; clearing or dropping the
/// slot aborts it.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Replaces the tracked task, aborting the previous one
    pub fn set(&mut self, handle: JoinHandle<()>) {
        self.clear();
        self.handle = Some(handle);
    }

    /// Posts `message` into `inbox` once `delay` has elapsed
    pub fn arm<T>(&mut self, delay: Duration, inbox: &mpsc::UnboundedSender<T>, message: T)
    where
        T: Send + 'static,
    {
        let inbox = inbox.clone();
        self.set(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the stream was disposed
            let _ = inbox.send(message);
        }));
    }

    /// Whether a timer is still pending
    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Abort the pending timer, if any
    pub fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.clear();
    }
}
