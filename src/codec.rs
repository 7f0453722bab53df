//! Fixed-size wire encoding: four big-endian `u32`s, sixteen bytes total,
//! no version byte, no length prefix, no checksum. `nodeId` is never on the
//! wire — the transport identifies the sender and the receiver supplies
//! that id to [`decode`] directly.
//!
//! This is the one seam in the crate where attacker- or network-controlled
//! bytes reach the core, so unlike the rest of the state machine (which
//! asserts on programmer error and never returns a `Result`), `decode`
//! reports malformed input as a [`ProtocolError`] instead of panicking.

use crate::config::ClockConfig;
use crate::error::ProtocolError;
use crate::offset_table::OffsetTable;
use crate::replay_clock::ReplayClock;

/// Size of the wire payload, in bytes.
pub const WIRE_LEN: usize = 16;

/// Encodes `clock` as `[hlc | bitmap | offsets | counter]`, each field a
/// big-endian `u32`. The offsets field is the clock's packed offset word
/// truncated to its low 32 bits, which is lossless as long as
/// `NUM_PROCS * MAX_OFFSET_SIZE <= 32` (spec's wire-format constraint);
/// widths wider than that are a measurement/introspection-only feature and
/// aren't expected to round-trip over the wire.
pub fn encode(clock: &ReplayClock) -> [u8; WIRE_LEN] {
    let bitmap = clock.offsets().bitmap();
    let offsets = clock.offsets().pack() as u32;

    let mut buf = [0u8; WIRE_LEN];
    buf[0..4].copy_from_slice(&clock.hlc().to_be_bytes());
    buf[4..8].copy_from_slice(&bitmap.to_be_bytes());
    buf[8..12].copy_from_slice(&offsets.to_be_bytes());
    buf[12..16].copy_from_slice(&clock.counter().to_be_bytes());
    buf
}

/// Decodes a 16-byte payload into a `ReplayClock` owned by `node_id`.
///
/// Returns [`ProtocolError::InvalidLength`] if `bytes` isn't exactly 16
/// bytes, or [`ProtocolError::NodeIdOutOfRange`] if `node_id` doesn't fit
/// `config`'s `NUM_PROCS`. Neither condition touches any `ReplayClock`
/// state — the host is expected to drop the message and move on.
pub fn decode(bytes: &[u8], node_id: u32, config: ClockConfig) -> Result<ReplayClock, ProtocolError> {
    if bytes.len() != WIRE_LEN {
        return Err(ProtocolError::InvalidLength(bytes.len()));
    }
    if node_id >= config.num_procs() {
        return Err(ProtocolError::NodeIdOutOfRange {
            peer_id: node_id,
            num_procs: config.num_procs(),
        });
    }

    let hlc = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let bitmap = u32::from_be_bytes(bytes[4..8].try_into().unwrap());
    let offsets_word = u32::from_be_bytes(bytes[8..12].try_into().unwrap()) as u64;
    let counter = u32::from_be_bytes(bytes[12..16].try_into().unwrap());

    let offsets = OffsetTable::from_packed(bitmap, offsets_word, config.max_offset_size());
    Ok(ReplayClock::from_parts(hlc, node_id, offsets, counter, config))
}
