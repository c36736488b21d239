use thiserror::Error;

/// Errors that can occur when building or configuring a notification stream.
///
/// Once a stream is running, failures are reported through its log sink
/// instead of being returned.
#[derive(Error, Debug)]
pub enum StreamError {
    /// WebSocket protocol error (connection failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// URL parsing error (malformed endpoint URL)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Endpoint URL does not use `ws` or `wss`
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid option value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for `Result<T, StreamError>`.
pub type Result<T> = std::result::Result<T, StreamError>;
