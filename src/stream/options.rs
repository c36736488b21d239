use crate::types::{
    DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_RECONNECT_BASE_DELAY_MS,
    DEFAULT_RECONNECT_MAX_DELAY_MS, DEFAULT_URL, Result, StreamError, env_vars,
};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Options for one notification stream instance.
///
/// Field names deserialize from the camelCase keys used by the editor
/// settings (`url`, `autoStart`, `reconnectBaseDelayMs`, ...). Missing keys
/// fall back to their defaults individually.
///
/// # Example
///
/// ```
/// use raina_stream::StreamOptions;
///
/// let options = StreamOptions::new("ws://localhost:8016/ws")
///     .with_auto_start(false)
///     .with_heartbeat_interval_ms(5_000);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamOptions {
    /// Target endpoint
    pub url: String,

    /// Connect immediately on construction
    pub auto_start: bool,

    /// Delay before the first reconnect; doubles per attempt
    pub reconnect_base_delay_ms: u64,

    /// Cap on the reconnect delay (before jitter)
    pub reconnect_max_delay_ms: u64,

    /// Period between pings while connected
    pub heartbeat_interval_ms: u64,

    /// Time to wait for a pong before forcing a reconnect
    pub idle_timeout_ms: u64,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            auto_start: true,
            reconnect_base_delay_ms: DEFAULT_RECONNECT_BASE_DELAY_MS,
            reconnect_max_delay_ms: DEFAULT_RECONNECT_MAX_DELAY_MS,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
        }
    }
}

impl StreamOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with `RAINA_STREAM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`, keyed by the
    /// `RAINA_STREAM_*` variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(url) = lookup(env_vars::URL) {
            options.url = url.trim().to_string();
        }
        overlay(&lookup, env_vars::AUTO_START, &mut options.auto_start)?;
        overlay(
            &lookup,
            env_vars::RECONNECT_BASE_DELAY_MS,
            &mut options.reconnect_base_delay_ms,
        )?;
        overlay(
            &lookup,
            env_vars::RECONNECT_MAX_DELAY_MS,
            &mut options.reconnect_max_delay_ms,
        )?;
        overlay(
            &lookup,
            env_vars::HEARTBEAT_INTERVAL_MS,
            &mut options.heartbeat_interval_ms,
        )?;
        overlay(&lookup, env_vars::IDLE_TIMEOUT_MS, &mut options.idle_timeout_ms)?;
        Ok(options)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = auto_start;
        self
    }

    pub fn with_reconnect_base_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_base_delay_ms = delay_ms;
        self
    }

    pub fn with_reconnect_max_delay_ms(mut self, delay_ms: u64) -> Self {
        self.reconnect_max_delay_ms = delay_ms;
        self
    }

    pub fn with_heartbeat_interval_ms(mut self, interval_ms: u64) -> Self {
        self.heartbeat_interval_ms = interval_ms;
        self
    }

    pub fn with_idle_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.idle_timeout_ms = timeout_ms;
        self
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Checks the URL and timing values.
    ///
    /// # Errors
    ///
    /// - [`StreamError::UrlParse`] if the URL is malformed
    /// - [`StreamError::UnsupportedScheme`] if it is not `ws`/`wss`
    /// - [`StreamError::Config`] for zero or inverted delays
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(StreamError::UnsupportedScheme(url.scheme().to_string()));
        }

        if self.reconnect_base_delay_ms == 0 {
            return Err(StreamError::Config(
                "reconnectBaseDelayMs must be greater than zero".to_string(),
            ));
        }
        if self.reconnect_max_delay_ms < self.reconnect_base_delay_ms {
            return Err(StreamError::Config(format!(
                "reconnectMaxDelayMs ({}) must not be below reconnectBaseDelayMs ({})",
                self.reconnect_max_delay_ms, self.reconnect_base_delay_ms
            )));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(StreamError::Config(
                "heartbeatIntervalMs must be greater than zero".to_string(),
            ));
        }
        if self.idle_timeout_ms == 0 {
            return Err(StreamError::Config(
                "idleTimeoutMs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn overlay<F, T>(lookup: &F, name: &str, slot: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    if let Some(raw) = lookup(name) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| StreamError::Config(format!("{}={:?}: {}", name, raw, e)))?;
    }
    Ok(())
}
