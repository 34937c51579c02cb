//! PRNG with a searchable queue — FreeBSD/XNU-style.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::method::IpidMethod;
use crate::packet::Packet;

struct Inner {
    /// Ring buffer of the `Q` most recently issued IPIDs.
    queue: Vec<u16>,
    /// `presence[v]` is true iff `v` currently occurs in `queue`.
    presence: Vec<bool>,
    head: usize,
    count: usize,
    rng: SmallRng,
}

/// `Q` reserved IPIDs held out of the candidate pool; `Q <= 2^15` bounds the
/// rejection loop in `assign` (at most `Q + 1` of the 2^16 values are ever
/// disallowed: the queued set plus 0).
pub struct PrngQueue {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl PrngQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: vec![0u16; capacity],
                presence: vec![false; 1 << 16],
                head: 0,
                count: 0,
                rng: SmallRng::from_entropy(),
            }),
            capacity,
        }
    }
}

impl IpidMethod for PrngQueue {
    fn assign(&self, _packet: &Packet, _thread_id: usize) -> u16 {
        let mut inner = self.inner.lock().unwrap();

        let ipid = loop {
            let candidate: u16 = inner.rng.gen();
            if candidate != 0 && !inner.presence[candidate as usize] {
                break candidate;
            }
        };

        if inner.count < self.capacity {
            let count = inner.count;
            inner.queue[count] = ipid;
            inner.presence[ipid as usize] = true;
            inner.count += 1;
        } else {
            let head = inner.head;
            let evicted = inner.queue[head];
            inner.queue[head] = ipid;
            inner.head = (head + 1) % self.capacity;
            inner.presence[ipid as usize] = true;
            inner.presence[evicted as usize] = false;
        }

        ipid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_returns_zero() {
        let m = PrngQueue::new(4096);
        let p = Packet::new(0, 0, 0, 0, 0);
        for _ in 0..50_000 {
            assert_ne!(m.assign(&p, 0), 0);
        }
    }

    #[test]
    fn presence_set_matches_the_queue_contents() {
        let capacity = 256;
        let m = PrngQueue::new(capacity);
        let p = Packet::new(0, 0, 0, 0, 0);
        for _ in 0..capacity * 4 {
            m.assign(&p, 0);
        }
        let inner = m.inner.lock().unwrap();
        assert_eq!(inner.count, capacity);
        let in_queue: std::collections::HashSet<u16> = inner.queue.iter().copied().collect();
        assert_eq!(in_queue.len(), capacity);
        for v in 0..=u16::MAX {
            assert_eq!(inner.presence[v as usize], in_queue.contains(&v), "mismatch at {v}");
        }
    }

    #[test]
    fn queue_never_exceeds_capacity() {
        let capacity = 4096;
        let m = PrngQueue::new(capacity);
        let p = Packet::new(0, 0, 0, 0, 0);
        for _ in 0..capacity * 10 {
            m.assign(&p, 0);
        }
        let inner = m.inner.lock().unwrap();
        assert!(inner.count <= capacity);
    }
}
