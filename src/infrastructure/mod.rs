// Infrastructure module - Background timers used by the stream driver
pub mod heartbeat;
pub mod timer;
pub mod timer_slot;

pub use heartbeat::HeartbeatManager;
pub use timer::{ReconnectTimer, rounded_secs};
pub use timer_slot::TimerSlot;
