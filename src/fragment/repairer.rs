//! In-place fragment reordering.

use super::matcher::continuation;
use super::{fragment_len, ScanCounts, DEFAULT_FRAGLEN, DEFAULT_WINDOW};
use crate::packet::Packet;
use serde::Serialize;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairOptions {
    /// Largest payload counted as a fragment.
    pub fraglen: usize,
    /// How many positions back to search for a predecessor.
    pub window: usize,
}

impl Default for RepairOptions {
    fn default() -> Self {
        RepairOptions {
            fraglen: DEFAULT_FRAGLEN,
            window: DEFAULT_WINDOW,
        }
    }
}

/// A fragment moved from `from` to just behind its predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentMove {
    pub from: usize,
    pub predecessor: usize,
    pub seq: u32,
    pub predecessor_seq: u32,
    /// Packets between predecessor and fragment before the move.
    pub separation: usize,
    pub length: usize,
}

impl FragmentMove {
    /// Position of the fragment after the move.
    pub fn to(&self) -> usize {
        self.predecessor + 1
    }
}

impl fmt::Display for FragmentMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trace[{}]: Moving fragment TCP.seq={} belonging to Trace[{}], TCP.seq={}, separation: {} packets, fragment length: {}",
            self.from, self.seq, self.predecessor, self.predecessor_seq, self.separation, self.length
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub total: u64,
    pub fragments: u64,
    pub reordered: u64,
    pub moves: Vec<FragmentMove>,
}

/// Scans a mutable sequence position by position, moving each fragment that
/// has a predecessor in the backward window to directly after it.
///
/// The outer scan advances through original positions even though moves
/// shift packets under it: after a move, the packet pushed into position `i`
/// is not inspected again. Only packets in `[j+1, i]` change position, and
/// their relative order is otherwise kept.
#[derive(Debug, Default)]
pub struct Repairer {
    options: RepairOptions,
    counts: ScanCounts,
}

impl Repairer {
    pub fn new(options: RepairOptions) -> Self {
        Repairer {
            options,
            counts: ScanCounts::default(),
        }
    }

    pub fn counts(&self) -> ScanCounts {
        self.counts
    }

    /// Inspect position `i` and relocate the packet there if it is a
    /// fragment whose predecessor lies in the window.
    pub fn inspect<P: AsRef<Packet>>(&mut self, packets: &mut [P], i: usize) -> Option<FragmentMove> {
        let packet = packets.get(i)?.as_ref();
        packet.payload.as_ref()?;
        self.counts.total += 1;

        let length = fragment_len(packet, self.options.fraglen)?;
        self.counts.fragments += 1;

        let found = self.search_range(i).find_map(|j| {
            let c = continuation(packets[j].as_ref(), packet)?;
            Some(FragmentMove {
                from: i,
                predecessor: j,
                seq: c.seq,
                predecessor_seq: c.predecessor_seq,
                separation: i - j - 1,
                length,
            })
        })?;

        self.counts.broken += 1;
        relocate(packets, found.from, found.predecessor);
        Some(found)
    }

    /// Backward positions searched for the packet at `i`, oldest first. The
    /// immediate predecessor position `i - 1` is excluded: a match there is
    /// already in order. Position 0 gets an empty range.
    fn search_range(&self, i: usize) -> Range<usize> {
        i.saturating_sub(self.options.window)..i.saturating_sub(1)
    }
}

/// Move the packet at `from` to `predecessor + 1`, shifting the packets in
/// between one position later.
fn relocate<P>(packets: &mut [P], from: usize, predecessor: usize) {
    packets[predecessor + 1..=from].rotate_right(1);
}

/// Run the repairer over a whole sequence, mutating it in place.
pub fn repair<P: AsRef<Packet>>(packets: &mut [P], options: RepairOptions) -> RepairReport {
    let mut repairer = Repairer::new(options);
    let mut moves = Vec::new();
    for i in 0..packets.len() {
        if let Some(m) = repairer.inspect(packets, i) {
            moves.push(m);
        }
    }
    let counts = repairer.counts();
    RepairReport {
        total: counts.total,
        fragments: counts.fragments,
        reordered: counts.broken,
        moves,
    }
}
