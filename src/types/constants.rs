/// Default notification endpoint
pub const DEFAULT_URL: &str = "ws://localhost:8016/ws";

/// Default reconnect backoff bounds (milliseconds)
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 15000;

/// Default heartbeat interval (milliseconds)
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 15000;

/// Default time to wait for a pong (milliseconds)
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 20000;

/// Upper bound (exclusive) of the random jitter added to each reconnect delay
pub const RECONNECT_JITTER_MS: u64 = 250;

/// Record fields consumed by log line normalization (magic strings layer)
pub mod record_fields {
    pub const EVENT: &str = "event";
    pub const TYPE: &str = "type";
    pub const LEVEL: &str = "level";
    pub const SEVERITY: &str = "severity";
    pub const MESSAGE: &str = "message";
    pub const TEXT: &str = "text";
    pub const DETAIL: &str = "detail";
    pub const DATA: &str = "data";
    pub const ROUTING_KEY: &str = "routing_key";

    /// Fields excluded from the residual object
    pub const CONSUMED: [&str; 7] = [EVENT, TYPE, LEVEL, SEVERITY, MESSAGE, TEXT, DETAIL];
}

/// Fallbacks used when a record lacks the field
pub const FALLBACK_EVENT_NAME: &str = "event";
pub const FALLBACK_LEVEL: &str = "info";

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
pub const WS_CLOSE_NO_STATUS: u16 = 1005;
pub const WS_CLOSE_ABNORMAL: u16 = 1006;

/// Environment variables read by `StreamOptions::from_env`
pub mod env_vars {
    pub const URL: &str = "RAINA_STREAM_URL";
    pub const AUTO_START: &str = "RAINA_STREAM_AUTO_START";
    pub const RECONNECT_BASE_DELAY_MS: &str = "RAINA_STREAM_RECONNECT_BASE_DELAY_MS";
    pub const RECONNECT_MAX_DELAY_MS: &str = "RAINA_STREAM_RECONNECT_MAX_DELAY_MS";
    pub const HEARTBEAT_INTERVAL_MS: &str = "RAINA_STREAM_HEARTBEAT_INTERVAL_MS";
    pub const IDLE_TIMEOUT_MS: &str = "RAINA_STREAM_IDLE_TIMEOUT_MS";
}

/// Kinds of messages forwarded to UI-facing consumers
pub mod forward_kinds {
    pub const NOTIFICATION: &str = "notification";
    pub const STEP: &str = "discovery.step";
}

/// Routing key segment marking step events (`discovery.step.started`)
pub const STEP_SEGMENT: &str = "step";
