pub mod client;
pub mod error;
pub mod protocol;
pub mod serial;

pub use client::*;
pub use error::*;
pub use protocol::{classify_reply, decode_reply, Command, CommandOutcome, PUMP_DONE_MARKER};
pub use serial::*;
