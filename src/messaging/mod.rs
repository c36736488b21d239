// Messaging module - Forwarding stream events to UI-facing consumers
pub mod event;
pub mod router;

pub use event::{ForwardKind, ForwardedMessage};
pub use router::EventRouter;
