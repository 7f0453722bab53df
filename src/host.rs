//! The thin contract between the clock core and its host.
//!
//! Everything else a real deployment needs — packet framing, a scheduler,
//! peer selection, retransmission — is out of scope (see the crate docs).
//! What's in scope is the seam those layers call through: a source of the
//! host's local tick, and the two places a host must touch the clock (a
//! local event, and an incoming payload). [`HostAdapter`] is that seam,
//! plus the one piece of telemetry the host layer is expected to emit.

use crate::codec;
use crate::config::ClockConfig;
use crate::error::ProtocolError;
use crate::replay_clock::ReplayClock;

/// The host's monotonically non-decreasing logical tick, already divided
/// by `INTERVAL`. The core is agnostic to where this comes from — NTP, a
/// hardware counter, a simulated clock in a discrete-event scheduler.
pub trait TimeSource {
    fn now(&self) -> u32;
}

/// Binds a [`ReplayClock`] to a [`TimeSource`] and mediates the two
/// transitions a host ever needs to drive: a local event, and an incoming
/// message. Every transition also emits a `tracing` event carrying the
/// clock's full state and sizing measurements, so a host gets
/// introspection for free without having to reach into clock internals.
pub struct HostAdapter<T: TimeSource> {
    clock: ReplayClock,
    time_source: T,
    local_addr: String,
}

impl<T: TimeSource> HostAdapter<T> {
    pub fn new(clock: ReplayClock, time_source: T, local_addr: impl Into<String>) -> Self {
        Self {
            clock,
            time_source,
            local_addr: local_addr.into(),
        }
    }

    pub fn clock(&self) -> &ReplayClock {
        &self.clock
    }

    /// Drives `SendLocal` off the time source's current tick and returns
    /// the wire payload to hand to the transport.
    pub fn on_local_event(&mut self) -> [u8; codec::WIRE_LEN] {
        let tick = self.time_source.now();
        self.clock.send_local(tick);
        let payload = codec::encode(&self.clock);
        self.emit_telemetry("send", None);
        payload
    }

    /// Decodes an incoming payload as belonging to `peer_id` and drives
    /// `Recv` off it. On a protocol error, the message is dropped and the
    /// clock is left untouched.
    pub fn on_receive(
        &mut self,
        bytes: &[u8],
        peer_id: u32,
        remote_addr: &str,
    ) -> Result<(), ProtocolError> {
        let peer_clock = codec::decode(bytes, peer_id, self.clock.config())?;
        let tick = self.time_source.now();
        self.clock.recv(&peer_clock, tick);
        self.emit_telemetry("recv", Some(remote_addr));
        Ok(())
    }

    fn emit_telemetry(&self, kind: &str, remote_addr: Option<&str>) {
        let config: ClockConfig = self.clock.config();
        tracing::info!(
            kind,
            local_addr = %self.local_addr,
            remote_addr = remote_addr.unwrap_or("-"),
            hlc = self.clock.hlc(),
            bitmap = self.clock.offsets().bitmap(),
            offsets = self.clock.offsets().pack(),
            counter = self.clock.counter(),
            num_procs = config.num_procs(),
            epsilon = config.epsilon(),
            interval = config.interval(),
            max_offset_size = config.max_offset_size(),
            offset_bytes = self.clock.offset_byte_size(),
            counter_bytes = self.clock.counter_byte_size(),
            clock_bytes = self.clock.clock_byte_size(),
            max_offset = self.clock.max_offset(),
            "replay clock transition",
        );
    }
}
