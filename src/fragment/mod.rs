//! Fragment detection and repair.
//!
//! An application message that the sender split over several TCP segments
//! shows up in a capture as a short segment (a *fragment*) whose sequence
//! number continues an earlier segment of the same flow. When other traffic
//! is interleaved between the two, downstream tools that treat each segment
//! as one message misbehave. The [`detector`] reports such fragments and how
//! far they are from their predecessor; the [`repairer`] moves each one back
//! behind its predecessor.

pub mod detector;
pub mod matcher;
pub mod repairer;
pub mod window;

use crate::packet::Packet;
use serde::Serialize;

pub use detector::{detect, DetectOptions, DetectReport, Detector, FragmentMatch};
pub use matcher::{continuation, matches, Continuation};
pub use repairer::{repair, FragmentMove, RepairOptions, RepairReport, Repairer};
pub use window::HistoryWindow;

/// Largest payload, in bytes, treated as a fragment.
pub const DEFAULT_FRAGLEN: usize = 7;

/// Number of earlier packets searched for a predecessor.
pub const DEFAULT_WINDOW: usize = 10;

/// Running counters of a scan. Only payload-bearing packets are counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounts {
    /// Packets carrying a payload.
    pub total: u64,
    /// Payload-bearing packets at or below the fragment length.
    pub fragments: u64,
    /// Fragments matched to a predecessor (reported or moved).
    pub broken: u64,
}

/// Payload length of `packet` if it is a fragment candidate.
#[inline]
pub fn fragment_len(packet: &Packet, fraglen: usize) -> Option<usize> {
    packet.payload_len().filter(|&len| len <= fraglen)
}
