//! Per-bucket shuffle (proposed) — `B` independent Knuth-shuffle states.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::method::IpidMethod;
use crate::methods::prng_shuffle::ShuffleState;
use crate::packet::Packet;
use crate::siphash::bucket_index;

/// The reserved-IPID count is fixed at 2^15 across buckets regardless of `B`.
const RESERVED: u32 = 1 << 15;

/// `B` (valid range `2..16`) independent shuffle states, each behind its own
/// mutex, selected by SipHash. Kept small so total storage stays comparable
/// to a coarse-grained per-bucket baseline.
pub struct PerBucketShuffle {
    buckets: Vec<Mutex<ShuffleState>>,
    k1: u64,
    k2: u64,
}

impl PerBucketShuffle {
    pub fn new(bucket_count: usize) -> Self {
        let mut rng = SmallRng::from_entropy();
        Self {
            buckets: (0..bucket_count).map(|_| Mutex::new(ShuffleState::new(RESERVED))).collect(),
            k1: rng.gen(),
            k2: rng.gen(),
        }
    }
}

impl IpidMethod for PerBucketShuffle {
    fn assign(&self, packet: &Packet, _thread_id: usize) -> u16 {
        let idx = bucket_index(packet.dst_addr, packet.src_addr, packet.protocol, self.k1, self.k2, self.buckets.len());
        self.buckets[idx].lock().unwrap().next()
    }
}
