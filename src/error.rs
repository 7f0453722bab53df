//! Errors surfaced at the host boundary.
//!
//! The core state machine itself is total and asserts on programmer
//! errors (see the module docs on [`crate::replay_clock`]); it never
//! returns a `Result`. The one place network-controlled input meets this
//! crate is [`crate::codec::decode`], and that's the only place a
//! recoverable error type is warranted.

use thiserror::Error;

/// A malformed wire payload or an out-of-range peer id handed to the codec.
/// The host is expected to drop the offending message and carry on; no
/// `ReplayClock` state is touched when this is returned.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("replay clock payload must be exactly 16 bytes, got {0}")]
    InvalidLength(usize),

    #[error("peer id {peer_id} is out of range for NUM_PROCS={num_procs}")]
    NodeIdOutOfRange { peer_id: u32, num_procs: u32 },
}
