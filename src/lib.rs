//! Replay Clock (RepCL): a compact, bit-packed hybrid-logical clock for
//! asynchronous distributed systems, tolerant of bounded clock skew.
//!
//! A [`ReplayClock`] tracks a hybrid-logical-clock scalar (`hlc`) together
//! with a per-peer *offset table* recording how far each recent
//! contributor lagged `hlc` at the moment it last contributed. Offsets
//! `>= epsilon` (the configured skew tolerance) are forgotten, which bounds
//! the table's size to however many peers have been heard from recently —
//! unlike a vector clock, whose size only grows with the number of
//! processes in the system.
//!
//! Two transitions are all a host ever drives directly:
//! [`ReplayClock::send_local`] on a local event, and [`ReplayClock::recv`]
//! on an incoming peer clock (after decoding it with [`codec::decode`]).
//! [`host::HostAdapter`] wraps both behind a small adapter that also
//! supplies the host's logical tick and emits a telemetry event per
//! transition.
//!
//! What this crate does *not* do: transport, retransmission, datagram
//! ordering, persistence, or clock-source discipline. It consumes
//! whatever monotonically-non-decreasing tick its host hands it and has no
//! opinion on where that tick came from.

pub mod bitpack;
pub mod codec;
pub mod config;
pub mod error;
pub mod host;
pub mod offset_table;
pub mod replay_clock;

pub use codec::{decode, encode};
pub use config::ClockConfig;
pub use error::ProtocolError;
pub use host::{HostAdapter, TimeSource};
pub use offset_table::OffsetTable;
pub use replay_clock::ReplayClock;
