//! Global atomic counter — the simplest of the eight strategies.

use std::sync::atomic::{AtomicU16, Ordering::Relaxed};

use crate::method::IpidMethod;
use crate::packet::Packet;

/// A single atomic `u16` counter shared by every thread.
///
/// Relaxed ordering suffices: the benchmark measures throughput of the
/// primitive itself, not any cross-thread happens-before relationship
/// carried by the returned IPIDs.
pub struct Global {
    counter: AtomicU16,
}

impl Global {
    pub fn new() -> Self {
        Self { counter: AtomicU16::new(0) }
    }
}

impl Default for Global {
    fn default() -> Self {
        Self::new()
    }
}

impl IpidMethod for Global {
    fn assign(&self, _packet: &Packet, _thread_id: usize) -> u16 {
        let prev = self.counter.fetch_add(1, Relaxed);
        prev.wrapping_add(1)
    }
}
