//! The uniform dispatch surface every IPID selection strategy implements.

use crate::packet::Packet;

/// `assign(packet, thread_id) -> u16`.
///
/// `thread_id` is stable for the lifetime of the trial for a given worker
/// (`0..n-1`); implementations that don't need it ignore it. Must be safe to
/// call concurrently from distinct threads with distinct ids and arbitrary
/// interleaving, and must not suspend other than for internal lock
/// acquisition. There is no failure mode: `assign` always returns a value.
pub trait IpidMethod: Send + Sync {
    fn assign(&self, packet: &Packet, thread_id: usize) -> u16;
}
