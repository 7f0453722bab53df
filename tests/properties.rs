//! Property tests for the invariants `ReplayClock` must hold after every
//! transition, plus the codec round-trip and `recv`'s order-independence
//! on disjoint updates.
//!
//! Shift idempotence exercises a private helper and is covered inline
//! in `src/replay_clock.rs`'s own test module instead of here.

use proptest::prelude::*;
use replay_clock::{codec, ClockConfig, OffsetTable, ReplayClock};

const NUM_PROCS: u32 = 3;
const MAX_OFFSET_SIZE: u32 = 4;
const EPSILON: u32 = 8;
const INTERVAL: u32 = 1;

fn config() -> ClockConfig {
    ClockConfig::new(NUM_PROCS, MAX_OFFSET_SIZE, EPSILON, INTERVAL)
}

fn assert_universal_invariants(clock: &ReplayClock, prev_hlc: u32) {
    // hlc never moves backwards.
    assert!(clock.hlc() >= prev_hlc, "hlc went backwards: {} -> {}", prev_hlc, clock.hlc());
    // popcount(bitmap) == number of stored offsets.
    assert_eq!(
        clock.offsets().bitmap().count_ones() as usize,
        clock.offsets().len(),
        "bitmap/offsets length mismatch"
    );
    // every stored offset is < epsilon.
    for (peer_id, offset) in clock.offsets().iter_present() {
        assert!(offset < EPSILON, "peer {peer_id} offset {offset} >= epsilon {EPSILON}");
    }
    // the owner is always present in its own table.
    assert!(clock.offsets().is_present(clock.node_id()), "node is missing from its own table");
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Send { actor: u32, tick: u32 },
    Recv { actor: u32, peer: u32, tick: u32 },
}

impl Op {
    fn actor(self) -> u32 {
        match self {
            Op::Send { actor, .. } => actor,
            Op::Recv { actor, .. } => actor,
        }
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..NUM_PROCS, 0u32..30).prop_map(|(actor, tick)| Op::Send { actor, tick }),
        (0..NUM_PROCS, 0..NUM_PROCS, 0u32..30).prop_map(|(actor, peer, tick)| Op::Recv { actor, peer, tick }),
    ]
}

proptest! {
    #[test]
    fn invariants_hold_after_every_transition(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let config = config();
        let mut nodes: Vec<ReplayClock> = (0..NUM_PROCS).map(|id| ReplayClock::new(id, config)).collect();
        let mut prev_hlc: Vec<u32> = vec![0; NUM_PROCS as usize];

        for op in ops {
            match op {
                Op::Send { actor, tick } => {
                    nodes[actor as usize].send_local(tick);
                }
                Op::Recv { actor, peer, tick } => {
                    if actor == peer {
                        continue;
                    }
                    let peer_clock = nodes[peer as usize].clone();
                    nodes[actor as usize].recv(&peer_clock, tick);
                }
            }
            let actor = op.actor() as usize;
            assert_universal_invariants(&nodes[actor], prev_hlc[actor]);
            prev_hlc[actor] = nodes[actor].hlc();
        }
    }

    /// The wire codec round-trips hlc/bitmap/offsets/counter exactly, with
    /// the receiver's own node_id standing in for the sender's
    /// (untransmitted) one.
    #[test]
    fn codec_round_trip_preserves_every_field(
        hlc in any::<u32>(),
        bitmap in 0u32..(1 << NUM_PROCS),
        counter in any::<u32>(),
        sender_id in 0..NUM_PROCS,
        receiver_id in 0..NUM_PROCS,
    ) {
        let config = config();
        let mut table = OffsetTable::new(MAX_OFFSET_SIZE);
        let mut rank = 0u32;
        for peer in 0..NUM_PROCS {
            if (bitmap >> peer) & 1 == 1 {
                table.set_offset(peer, rank % EPSILON);
                rank += 1;
            }
        }
        let clock = ReplayClock::from_parts(hlc, sender_id, table, counter, config);

        let bytes = codec::encode(&clock);
        let decoded = codec::decode(&bytes, receiver_id, config).unwrap();

        prop_assert_eq!(decoded.hlc(), hlc);
        prop_assert_eq!(decoded.offsets().bitmap(), bitmap);
        prop_assert_eq!(decoded.counter(), counter);
        prop_assert_eq!(decoded.node_id(), receiver_id);
        for (peer_id, offset) in clock.offsets().iter_present() {
            prop_assert_eq!(decoded.offsets().get_offset(peer_id), offset);
        }
    }
}

/// Receiving two peer clocks that are both already at or behind the
/// current epoch and add no new tracked peers commutes on
/// `(hlc, bitmap, offsets)` — only the counter may differ by order.
#[test]
fn recv_commutes_for_disjoint_no_new_peer_updates() {
    let config = config();

    let mut base = ReplayClock::new(0, config);
    base.send_local(10);
    let peer1 = ReplayClock::new(1, config);
    base.recv(&peer1, 10);
    let peer2 = ReplayClock::new(2, config);
    base.recv(&peer2, 10);
    // base now tracks all three peers; use it as the common starting point
    // for both orderings below.

    let mut p1 = ReplayClock::new(1, config);
    p1.send_local(4); // hlc=4, behind base's hlc=10
    let mut p2 = ReplayClock::new(2, config);
    p2.send_local(6); // hlc=6, behind base's hlc=10

    let mut order_a = base.clone();
    order_a.recv(&p1, 10);
    order_a.recv(&p2, 10);

    let mut order_b = base.clone();
    order_b.recv(&p2, 10);
    order_b.recv(&p1, 10);

    assert_eq!(order_a.hlc(), order_b.hlc());
    assert_eq!(order_a.offsets().bitmap(), order_b.offsets().bitmap());
    for (peer_id, offset) in order_a.offsets().iter_present() {
        assert_eq!(order_b.offsets().get_offset(peer_id), offset);
    }
}
