//! Stop-and-wait sender and receiver agents.

pub mod receiver;
pub mod sender;

#[cfg(test)]
mod testing;

pub use receiver::{ReceiverAgent, ReceiverConfig, ReceiverError, ReceiverReport};
pub use sender::{AckOutcome, SenderAgent, SenderConfig, SenderError, TransferReport};

/// Reserved message that shuts the receiver down once it has been
/// reassembled and acknowledged.
pub const SHUTDOWN_SENTINEL: &[u8] = b"STOP";
