pub mod constants;
pub mod error;
pub mod message;

pub use constants::*;
pub use error::{Result, StreamError};
pub use message::{DecodedFrame, StreamEvent, decode_frame, normalize_record};
