//! Boot-time configuration shared by every `ReplayClock` on a process.
//!
//! `NUM_PROCS`, `MAX_OFFSET_SIZE`, `EPSILON`, and `INTERVAL` are
//! process-wide constants in the source this crate is grounded on. Baking
//! them in as literal constants would make it impossible to run more than
//! one configuration in the same address space (handy for tests, and for
//! a host that wants to size two clocks differently). `ClockConfig` carries
//! them as an ordinary value instead, validated once at construction.

/// Validated configuration for a `ReplayClock`. Cheap to `Clone`; every
/// clock on a process typically shares the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    num_procs: u32,
    max_offset_size: u32,
    epsilon: u32,
    interval: u32,
}

impl ClockConfig {
    /// Builds a config, panicking if any of the range constraints between
    /// `num_procs`, `max_offset_size`, `epsilon`, and `interval` don't
    /// hold. These are boot-time/programmer errors, not runtime
    /// conditions, so a panic (rather than a `Result`) is appropriate.
    pub fn new(num_procs: u32, max_offset_size: u32, epsilon: u32, interval: u32) -> Self {
        assert!(
            (1..=32).contains(&num_procs),
            "NUM_PROCS must be in 1..=32, got {num_procs}"
        );
        assert!(max_offset_size >= 1, "MAX_OFFSET_SIZE must be >= 1");
        assert!(
            num_procs.saturating_mul(max_offset_size) <= 64,
            "NUM_PROCS * MAX_OFFSET_SIZE ({}) exceeds the 64-bit word used to pack offsets",
            num_procs as u64 * max_offset_size as u64
        );
        let epsilon_ceiling = if max_offset_size >= 32 {
            u32::MAX
        } else {
            1u32 << max_offset_size
        };
        assert!(
            epsilon >= 1 && epsilon < epsilon_ceiling,
            "EPSILON must satisfy 1 <= EPSILON < 2^MAX_OFFSET_SIZE"
        );
        assert!(interval >= 1, "INTERVAL must be >= 1");

        Self {
            num_procs,
            max_offset_size,
            epsilon,
            interval,
        }
    }

    pub fn num_procs(&self) -> u32 {
        self.num_procs
    }

    pub fn max_offset_size(&self) -> u32 {
        self.max_offset_size
    }

    pub fn epsilon(&self) -> u32 {
        self.epsilon
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }
}
