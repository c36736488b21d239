use crate::types::DEFAULT_HEARTBEAT_INTERVAL_MS;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS);

/// Periodic heartbeat ticker.
///
/// The ticker only signals that a ping is due; sending the ping and arming
/// the idle timer happen on the stream's event loop, which knows whether the
/// socket is still open.
pub struct HeartbeatManager {
    interval: Duration,
}

impl HeartbeatManager {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_HEARTBEAT_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the heartbeat task. The first tick fires one full interval
    /// after spawning.
    pub fn spawn<T>(self, inbox: mpsc::UnboundedSender<T>, tick: T) -> JoinHandle<()>
    where
        T: Clone + Send + 'static,
    {
        tokio::spawn(async move {
            let start = time::Instant::now() + self.interval;
            let mut interval_timer = time::interval_at(start, self.interval);
            interval_timer.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

            loop {
                interval_timer.tick().await;

                if inbox.send(tick.clone()).is_err() {
                    // Stream dropped, exit heartbeat task
                    break;
                }
                tracing::trace!("Heartbeat tick");
            }
        })
    }
}

impl Default for HeartbeatManager {
    fn default() -> Self {
        Self::new()
    }
}
