//! Per-connection — stateless zero-contention baseline.

use crate::method::IpidMethod;
use crate::packet::Packet;

/// Models the target OS's per-socket counter always being in cache when the
/// packet is constructed, i.e. the cost of reading it is effectively zero.
/// Establishes the benchmark's zero-contention upper bound.
#[derive(Default)]
pub struct PerConnection;

impl PerConnection {
    pub fn new() -> Self {
        Self
    }
}

impl IpidMethod for PerConnection {
    fn assign(&self, _packet: &Packet, _thread_id: usize) -> u16 {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_returns_one() {
        let m = PerConnection::new();
        let p = Packet::new(1, 2, 3, 4, 5);
        for _ in 0..10 {
            assert_eq!(m.assign(&p, 0), 1);
        }
    }
}
