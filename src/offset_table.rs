//! Dense encoding of the sparse `peer-id -> offset` mapping.
//!
//! An [`OffsetTable`] is a one-bit-per-peer presence bitmap plus a sequence
//! of offsets, one per set bit, in ascending peer-id order. Internally the
//! sequence is a plain `Vec<u32>` indexed by *storage rank* (the popcount of
//! the bitmap below a peer's bit), not by peer id — peer id only ever
//! indexes the bitmap. Runtime operations (`get_offset`, `set_offset`,
//! `remove`) work against this `Vec`, which keeps insertion and eviction
//! obviously correct; [`OffsetTable::pack`] and [`OffsetTable::from_packed`]
//! are the only places a bit-packed word (see [`crate::bitpack`]) is
//! actually materialized, for handing off to the wire codec.

use crate::bitpack;

/// A sparse `peer-id -> offset` map, dense-encoded as a presence bitmap and
/// a presence-rank-ordered list of offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetTable {
    bitmap: u32,
    offsets: Vec<u32>,
    width: u32,
}

impl OffsetTable {
    /// An empty table. `width` is `MAX_OFFSET_SIZE`, used only when packing
    /// to or unpacking from the wire representation.
    pub fn new(width: u32) -> Self {
        Self {
            bitmap: 0,
            offsets: Vec::new(),
            width,
        }
    }

    pub fn bitmap(&self) -> u32 {
        self.bitmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of peers currently tracked.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn is_present(&self, peer_id: u32) -> bool {
        (self.bitmap >> peer_id) & 1 == 1
    }

    /// Storage rank of `peer_id`: the number of set bits below it, i.e. the
    /// slot it occupies (or would occupy, if inserted) in `offsets`.
    pub fn index_of(&self, peer_id: u32) -> usize {
        let below = self.bitmap & ((1u32 << peer_id) - 1);
        below.count_ones() as usize
    }

    /// The peer's offset, or `0` if it isn't tracked.
    pub fn get_offset(&self, peer_id: u32) -> u32 {
        if self.is_present(peer_id) {
            self.offsets[self.index_of(peer_id)]
        } else {
            0
        }
    }

    /// Inserts `peer_id` at its storage rank if absent, otherwise overwrites
    /// its existing offset.
    pub fn set_offset(&mut self, peer_id: u32, value: u32) {
        let idx = self.index_of(peer_id);
        if self.is_present(peer_id) {
            self.offsets[idx] = value;
        } else {
            self.offsets.insert(idx, value);
            self.bitmap |= 1 << peer_id;
        }
    }

    /// Removes `peer_id` if tracked; a no-op otherwise.
    pub fn remove(&mut self, peer_id: u32) {
        if !self.is_present(peer_id) {
            return;
        }
        let idx = self.index_of(peer_id);
        self.offsets.remove(idx);
        self.bitmap &= !(1 << peer_id);
    }

    /// Ascending-peer-id `(peer_id, offset)` pairs. Finite, and a fresh
    /// sequence each call — there's no cursor to resume, by contract
    /// callers re-invoke rather than expect to pick up mid-iteration.
    pub fn iter_present(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let bitmap = self.bitmap;
        (0..32u32)
            .filter(move |p| (bitmap >> p) & 1 == 1)
            .map(move |p| (p, self.get_offset(p)))
    }

    /// Packs the offsets into a single bit-packed word, storage-rank
    /// ordered, for the wire codec.
    pub fn pack(&self) -> u64 {
        let mut word = 0u64;
        for (rank, &value) in self.offsets.iter().enumerate() {
            word = bitpack::set_at(word, self.width, rank as u32, value as u64);
        }
        word
    }

    /// Rebuilds a table from a presence bitmap and a packed offsets word,
    /// the inverse of [`OffsetTable::pack`].
    pub fn from_packed(bitmap: u32, packed: u64, width: u32) -> Self {
        let count = bitmap.count_ones();
        let offsets = (0..count)
            .map(|rank| bitpack::get_at(packed, width, rank) as u32)
            .collect();
        Self {
            bitmap,
            offsets,
            width,
        }
    }
}
