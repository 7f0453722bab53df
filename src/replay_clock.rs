//! The Replay Clock state machine.
//!
//! A `ReplayClock` is an HLC scalar (`hlc`) plus a per-peer offset table
//! (how far each recent contributor lags `hlc`) plus a tie-break counter.
//! Four transitions mutate it: the public `send_local` (a local event) and
//! `recv` (an incoming peer clock), and the private `shift`/`merge_same_epoch`
//! helpers those two call. Every transition is total — there is no failure
//! path through the state machine itself. The only conditions this module
//! treats as errors are programmer errors (an out-of-range `node_id`, or an
//! offset vector wider than the 64-bit word used to pack it), and those are
//! asserted at construction, not recovered from. Network-facing failures
//! (a malformed wire payload, an out-of-range peer id) live one layer up, in
//! [`crate::codec`].

use crate::config::ClockConfig;
use crate::offset_table::OffsetTable;

/// HLC scalar + offset table + tie-break counter for one process.
///
/// Cloning is the supported way to take a snapshot (`Recv` clones both
/// sides before shifting them); there is no reference-based variant.
#[derive(Clone, PartialEq, Eq)]
pub struct ReplayClock {
    hlc: u32,
    node_id: u32,
    offsets: OffsetTable,
    counter: u32,
    config: ClockConfig,
}

impl ReplayClock {
    /// A fresh clock: `hlc=0`, tracking only its own id at offset 0.
    ///
    /// Panics if `node_id` is out of range for `config`'s `NUM_PROCS` — this
    /// is a programmer error, not a runtime condition a host needs to
    /// recover from.
    pub fn new(node_id: u32, config: ClockConfig) -> Self {
        assert!(
            node_id < config.num_procs(),
            "node_id {node_id} is out of range for NUM_PROCS={}",
            config.num_procs()
        );
        let mut offsets = OffsetTable::new(config.max_offset_size());
        offsets.set_offset(node_id, 0);
        Self {
            hlc: 0,
            node_id,
            offsets,
            counter: 0,
            config,
        }
    }

    /// Reconstructs a clock from its decoded wire fields plus a
    /// receiver-supplied `node_id` (the wire format never transmits it —
    /// see [`crate::codec`]). Used by [`crate::codec::decode`]; exposed
    /// publicly for hosts and tests that need to assemble a clock from an
    /// already-known state rather than growing one via `send_local`/`recv`.
    pub fn from_parts(
        hlc: u32,
        node_id: u32,
        offsets: OffsetTable,
        counter: u32,
        config: ClockConfig,
    ) -> Self {
        Self {
            hlc,
            node_id,
            offsets,
            counter,
            config,
        }
    }

    pub fn hlc(&self) -> u32 {
        self.hlc
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    pub fn config(&self) -> ClockConfig {
        self.config
    }

    /// `(hlc, bitmap, offsets)` equality, ignoring the counter. Two clocks
    /// that differ only by counter are offset-identical; `Recv`'s tie-break
    /// resolution is built entirely out of this comparison.
    pub fn offset_identical(&self, other: &Self) -> bool {
        self.hlc == other.hlc && self.offsets == other.offsets
    }

    /// A local event (or outgoing send). `node_hlc` is the host's current
    /// logical tick (already divided by `INTERVAL`).
    pub fn send_local(&mut self, node_hlc: u32) {
        let new_hlc = self.hlc.max(node_hlc);
        let candidate_offset = new_hlc - node_hlc;
        let self_offset = self.offsets.get_offset(self.node_id);

        if new_hlc == self.hlc && self_offset <= candidate_offset {
            // Same epoch, and we already have at least as tight an offset
            // as this event would produce: it's a second, indistinguishable
            // event in the same state. Record it via the counter.
            self.counter += 1;
        } else if new_hlc == self.hlc {
            let tightened = candidate_offset.min(self_offset);
            self.offsets.set_offset(self.node_id, tightened);
            self.counter = 0;
        } else {
            self.counter = 0;
            self.shift(new_hlc);
            self.offsets.set_offset(self.node_id, 0);
        }
    }

    /// Ingest of an incoming peer clock. `node_hlc` is the host's current
    /// logical tick at the moment of receipt.
    pub fn recv(&mut self, peer: &ReplayClock, node_hlc: u32) {
        let new_hlc = self.hlc.max(peer.hlc).max(node_hlc);

        let local_before = self.clone();
        let peer_before = peer.clone();

        let mut merged = self.clone();
        let mut incoming = peer.clone();
        merged.shift(new_hlc);
        incoming.shift(new_hlc);
        merged.merge_same_epoch(&incoming);

        // Invariant-restore: a self-offset that exceeded epsilon during the
        // shift drops nodeId out of the table entirely. The owner always
        // appears in its own table, so re-insert it — at offset 0, since
        // that's the only offset a just-evicted self can truthfully claim.
        // If it's still present (it never got evicted), its merged offset
        // is left untouched.
        if !merged.offsets.is_present(self.node_id) {
            merged.offsets.set_offset(self.node_id, 0);
        }

        let local_matches = local_before.offset_identical(&merged);
        let peer_matches = peer_before.offset_identical(&merged);
        merged.counter = match (local_matches, peer_matches) {
            (true, true) => local_before.counter.max(peer_before.counter) + 1,
            (true, false) => local_before.counter + 1,
            (false, true) => peer_before.counter + 1,
            (false, false) => 0,
        };

        *self = merged;
    }

    /// Advances the reference epoch to `new_hlc`, shrinking every tracked
    /// offset accordingly and evicting any peer whose offset would reach
    /// or exceed `epsilon`. Private: only `send_local`/`recv` call this,
    /// and only ever with `new_hlc >= hlc`.
    fn shift(&mut self, new_hlc: u32) {
        debug_assert!(new_hlc >= self.hlc, "shift must not move hlc backwards");
        let epsilon = self.config.epsilon();
        let stale_hlc = self.hlc;

        let present: Vec<(u32, u32)> = self.offsets.iter_present().collect();
        for (peer_id, offset) in present {
            debug_assert!(offset <= stale_hlc, "stored offset cannot exceed hlc");
            let shifted = (new_hlc - (stale_hlc - offset)).min(epsilon);
            if shifted >= epsilon {
                self.offsets.remove(peer_id);
            } else {
                self.offsets.set_offset(peer_id, shifted);
            }
        }
        self.hlc = new_hlc;
    }

    /// Merges `other`'s offsets into `self`'s, in place. Requires both
    /// clocks already share the same `hlc` (the caller shifts both to a
    /// common epoch first). For each peer tracked by either side, the
    /// merged offset is the minimum of the two — where only one side
    /// tracks the peer at all, that side's offset stands as-is (the
    /// missing side contributes, in effect, infinity).
    fn merge_same_epoch(&mut self, other: &ReplayClock) {
        debug_assert_eq!(
            self.hlc, other.hlc,
            "merge_same_epoch requires both clocks already shifted to the same epoch"
        );
        let epsilon = self.config.epsilon();

        for peer_id in 0..self.config.num_procs() {
            let self_present = self.offsets.is_present(peer_id);
            let other_present = other.offsets.is_present(peer_id);
            if !self_present && !other_present {
                continue;
            }

            let merged_offset = match (self_present, other_present) {
                (true, true) => self
                    .offsets
                    .get_offset(peer_id)
                    .min(other.offsets.get_offset(peer_id)),
                (true, false) => self.offsets.get_offset(peer_id),
                (false, true) => other.offsets.get_offset(peer_id),
                (false, false) => unreachable!("filtered out above"),
            };

            if merged_offset >= epsilon {
                self.offsets.remove(peer_id);
            } else {
                self.offsets.set_offset(peer_id, merged_offset);
            }
        }
    }

    /// `ceil(popcount(bitmap) * MAX_OFFSET_SIZE / 8)` — measured size of
    /// the offset table, not the (fixed) wire size.
    pub fn offset_byte_size(&self) -> u32 {
        let bits = self.offsets.len() as u32 * self.config.max_offset_size();
        bits.div_ceil(8)
    }

    /// `ceil((floor(log2(counter)) + 1) / 8)`, or `0` if `counter == 0`.
    pub fn counter_byte_size(&self) -> u32 {
        bit_length(self.counter).div_ceil(8)
    }

    /// Sum of `offset_byte_size`, `counter_byte_size`, and the byte size of
    /// `hlc` itself.
    pub fn clock_byte_size(&self) -> u32 {
        self.offset_byte_size() + self.counter_byte_size() + bit_length(self.hlc).div_ceil(8)
    }

    /// The largest offset currently stored, or `0` if no peer is tracked.
    pub fn max_offset(&self) -> u32 {
        self.offsets.iter_present().map(|(_, offset)| offset).max().unwrap_or(0)
    }
}

impl std::fmt::Debug for ReplayClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplayClock")
            .field("node_id", &self.node_id)
            .field("hlc", &self.hlc)
            .field("offsets", &self.offsets.iter_present().collect::<Vec<_>>())
            .field("counter", &self.counter)
            .finish()
    }
}

/// `floor(log2(v)) + 1`, i.e. the number of bits needed to represent `v`;
/// `0` for `v == 0`.
fn bit_length(v: u32) -> u32 {
    32 - v.leading_zeros()
}
