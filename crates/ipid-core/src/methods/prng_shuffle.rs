//! PRNG with Knuth (Fisher-Yates) shuffle — OpenBSD-style.

use std::sync::Mutex;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::method::IpidMethod;
use crate::packet::Packet;

/// One shuffled permutation of `{0, ..., 2^16 - 1}` plus the cursor and RNG
/// that draw from it. Shared between the standalone [`PrngShuffle`] method
/// and each bucket of [`crate::methods::perbucket_shuffle::PerBucketShuffle`].
pub(crate) struct ShuffleState {
    perm: Vec<u16>,
    head: u16,
    /// Size of the "previous K positions" window excluded from being swapped
    /// back in immediately (the number of reserved IPIDs).
    reserved: u32,
    rng: SmallRng,
}

impl ShuffleState {
    pub(crate) fn new(reserved: u32) -> Self {
        let mut rng = SmallRng::from_entropy();
        let mut perm: Vec<u16> = (0..=u16::MAX).collect();
        // Fisher-Yates over the full 2^16 permutation.
        for i in (1..perm.len()).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }
        Self { perm, head: 0, reserved, rng }
    }

    /// Draws the next IPID, swapping it out of the cyclic reserved window.
    /// `u16` wraparound makes the window cyclic for free — `head - sample`
    /// wraps exactly like the `(head + 2^16 - sample) mod 2^16` a wider type
    /// would need to compute explicitly.
    pub(crate) fn next(&mut self) -> u16 {
        loop {
            let sample = self.rng.gen_range(0..self.reserved) as u16;
            let j = self.head.wrapping_sub(sample);
            let v = self.perm[self.head as usize];
            self.perm.swap(self.head as usize, j as usize);
            self.head = self.head.wrapping_add(1);
            if v != 0 {
                return v;
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn is_permutation(&self) -> bool {
        let mut seen = vec![false; 1 << 16];
        for &v in &self.perm {
            if seen[v as usize] {
                return false;
            }
            seen[v as usize] = true;
        }
        true
    }
}

/// `K` (the reserved-IPID count) is the `-a` argument; valid range `[2^12, 2^15]`.
pub struct PrngShuffle {
    inner: Mutex<ShuffleState>,
}

impl PrngShuffle {
    pub fn new(reserved: u32) -> Self {
        Self { inner: Mutex::new(ShuffleState::new(reserved)) }
    }
}

impl IpidMethod for PrngShuffle {
    fn assign(&self, _packet: &Packet, _thread_id: usize) -> u16 {
        self.inner.lock().unwrap().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_returns_zero() {
        let m = PrngShuffle::new(4096);
        let p = Packet::new(0, 0, 0, 0, 0);
        for _ in 0..50_000 {
            assert_ne!(m.assign(&p, 0), 0);
        }
    }

    #[test]
    fn array_remains_a_permutation_after_many_calls() {
        let m = PrngShuffle::new(4096);
        let p = Packet::new(0, 0, 0, 0, 0);
        for _ in 0..200_000 {
            m.assign(&p, 0);
        }
        assert!(m.inner.lock().unwrap().is_permutation());
    }

    #[test]
    fn fresh_state_is_already_a_permutation() {
        let s = ShuffleState::new(4096);
        assert!(s.is_permutation());
    }
}
