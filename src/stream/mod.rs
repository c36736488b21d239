// Module declarations
pub(crate) mod builder;
pub(crate) mod driver;
mod options;
mod state;
mod stream;

// Public API exports
pub use builder::{EventCallback, NotificationStreamBuilder};
pub use options::StreamOptions;
pub use state::{ConnectionState, StreamStatus};
pub use stream::NotificationStream;
