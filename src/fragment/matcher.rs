//! Contiguity predicate shared by the detector and the repairer.

use crate::packet::Packet;

/// Sequence numbers of a predecessor and the packet that continues it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub predecessor_seq: u32,
    pub seq: u32,
}

/// Returns the sequence numbers when `b` starts exactly where `a` ends in
/// the same flow direction.
///
/// Both packets need IP and TCP headers and a payload; anything missing is
/// simply "no match". Sequence arithmetic wraps at 2^32 like TCP itself.
pub fn continuation(a: &Packet, b: &Packet) -> Option<Continuation> {
    let a_len = a.payload_len()?;
    b.payload.as_ref()?;

    let a_key = a.flow_key()?;
    let b_key = b.flow_key()?;
    if a_key != b_key {
        return None;
    }

    let a_seq = a.seq()?;
    let b_seq = b.seq()?;
    if a_seq.wrapping_add(a_len as u32) != b_seq {
        return None;
    }

    Some(Continuation {
        predecessor_seq: a_seq,
        seq: b_seq,
    })
}

/// True iff `a` is the contiguous predecessor of `b`.
#[inline]
pub fn matches(a: &Packet, b: &Packet) -> bool {
    continuation(a, b).is_some()
}
