//! Read-only fragment scan.

use super::matcher::continuation;
use super::window::HistoryWindow;
use super::{fragment_len, ScanCounts, DEFAULT_FRAGLEN, DEFAULT_WINDOW};
use crate::packet::Packet;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectOptions {
    /// Largest payload counted as a fragment.
    pub fraglen: usize,
    /// Number of earlier payload-bearing packets kept for lookup.
    pub number: usize,
    /// Skip the newest history entry (the previous payload-bearing packet)
    /// when looking for a predecessor. Adjacent fragments are then never
    /// reported; this reproduces the older `check` behavior.
    pub exclude_newest: bool,
}

impl Default for DetectOptions {
    fn default() -> Self {
        DetectOptions {
            fraglen: DEFAULT_FRAGLEN,
            number: DEFAULT_WINDOW,
            exclude_newest: false,
        }
    }
}

/// A fragment and one history entry it continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FragmentMatch {
    /// Position of the fragment in the trace.
    pub index: usize,
    /// Position of the predecessor in the trace.
    pub predecessor_index: usize,
    pub seq: u32,
    pub predecessor_seq: u32,
    /// Payload-bearing packets seen between the predecessor and the fragment.
    pub separation: usize,
    pub length: usize,
}

impl fmt::Display for FragmentMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trace[{}]: Found fragment TCP.seq={} belonging to TCP.seq={}, separation: {} packets, fragment length: {}",
            self.index, self.seq, self.predecessor_seq, self.separation, self.length
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectReport {
    pub total: u64,
    pub fragments: u64,
    pub broken: u64,
    pub matches: Vec<FragmentMatch>,
}

#[derive(Debug, Clone, Copy)]
struct HistoryEntry<'a> {
    index: usize,
    packet: &'a Packet,
}

/// Streaming detector: feed packets in trace order with [`Detector::observe`].
///
/// The history window lags the scan by one packet: the current packet is
/// checked against the window first and pushed afterwards, so it is never a
/// candidate predecessor of itself.
#[derive(Debug)]
pub struct Detector<'a> {
    options: DetectOptions,
    history: HistoryWindow<HistoryEntry<'a>>,
    counts: ScanCounts,
}

impl<'a> Detector<'a> {
    pub fn new(options: DetectOptions) -> Self {
        Detector {
            options,
            history: HistoryWindow::new(options.number),
            counts: ScanCounts::default(),
        }
    }

    /// Observe the packet at trace position `index` and return every history
    /// entry it continues, oldest first.
    pub fn observe(&mut self, index: usize, packet: &'a Packet) -> Vec<FragmentMatch> {
        if packet.payload.is_none() {
            return Vec::new();
        }
        self.counts.total += 1;

        let mut found = Vec::new();
        if let Some(length) = fragment_len(packet, self.options.fraglen) {
            self.counts.fragments += 1;
            found = self.find_predecessors(index, packet, length);
            self.counts.broken += found.len() as u64;
        }

        self.history.push(HistoryEntry { index, packet });
        found
    }

    pub fn counts(&self) -> ScanCounts {
        self.counts
    }

    /// Number of history entries eligible as predecessors, counted from the
    /// oldest.
    fn lookup_slots(&self) -> usize {
        if self.options.exclude_newest {
            self.history.older().len()
        } else {
            self.history.len()
        }
    }

    fn find_predecessors(&self, index: usize, packet: &Packet, length: usize) -> Vec<FragmentMatch> {
        let newest = self.history.len().saturating_sub(1);
        self.history
            .candidates()
            .take(self.lookup_slots())
            .enumerate()
            .filter_map(|(slot, entry)| {
                let c = continuation(entry.packet, packet)?;
                Some(FragmentMatch {
                    index,
                    predecessor_index: entry.index,
                    seq: c.seq,
                    predecessor_seq: c.predecessor_seq,
                    separation: newest - slot,
                    length,
                })
            })
            .collect()
    }
}

/// Run the detector over a whole sequence. The sequence is not modified.
pub fn detect<P: AsRef<Packet>>(packets: &[P], options: DetectOptions) -> DetectReport {
    let mut detector = Detector::new(options);
    let mut matches = Vec::new();
    for (index, packet) in packets.iter().enumerate() {
        matches.extend(detector.observe(index, packet.as_ref()));
    }
    let counts = detector.counts();
    DetectReport {
        total: counts.total,
        fragments: counts.fragments,
        broken: counts.broken,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Endpoint;
    use std::net::{IpAddr, Ipv4Addr};

    fn ep(last: u8, port: u16) -> Endpoint {
        Endpoint {
            ip: IpAddr::V4(Ipv4Addr::new(10, 0, 0, last)),
            port,
        }
    }

    fn seg(seq: u32, len: usize) -> Packet {
        Packet::tcp_segment(ep(1, 40000), ep(2, 502), seq, &vec![0x11; len])
    }

    fn other(seq: u32, len: usize) -> Packet {
        Packet::tcp_segment(ep(3, 40001), ep(2, 502), seq, &vec![0x22; len])
    }

    fn opts(fraglen: usize, number: usize) -> DetectOptions {
        DetectOptions {
            fraglen,
            number,
            exclude_newest: false,
        }
    }

    #[test]
    fn adjacent_fragment_reported_with_zero_separation() {
        let trace = vec![seg(100, 50), seg(150, 3), seg(153, 20)];
        let report = detect(&trace, DetectOptions::default());
        assert_eq!(report.total, 3);
        assert_eq!(report.fragments, 1);
        assert_eq!(report.broken, 1);
        assert_eq!(
            report.matches,
            vec![FragmentMatch {
                index: 1,
                predecessor_index: 0,
                seq: 150,
                predecessor_seq: 100,
                separation: 0,
                length: 3,
            }]
        );
    }

    #[test]
    fn separation_counts_interleaved_packets() {
        let trace = vec![seg(0, 10), other(500, 20), other(520, 20), seg(10, 4)];
        let report = detect(&trace, DetectOptions::default());
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].separation, 2);
        assert_eq!(report.matches[0].index, 3);
    }

    #[test]
    fn packets_without_payload_are_not_counted_or_windowed() {
        let ack = seg(50, 0);
        let trace = vec![seg(0, 10), ack.clone(), ack.clone(), seg(10, 2)];
        let report = detect(&trace, DetectOptions::default());
        assert_eq!(report.total, 2);
        assert_eq!(report.fragments, 1);
        // Trace index still counts every packet.
        assert_eq!(report.matches[0].index, 3);
        assert_eq!(report.matches[0].separation, 0);
    }

    #[test]
    fn predecessor_outside_window_is_missed() {
        let mut trace = vec![seg(0, 10)];
        for i in 0..3 {
            trace.push(other(1000 + i * 20, 20));
        }
        trace.push(seg(10, 3));

        assert_eq!(detect(&trace, opts(7, 3)).matches.len(), 0);
        assert_eq!(detect(&trace, opts(7, 4)).matches.len(), 1);
    }

    #[test]
    fn zero_window_never_matches() {
        let trace = vec![seg(0, 10), seg(10, 2), seg(12, 2)];
        let report = detect(&trace, opts(7, 0));
        assert!(report.matches.is_empty());
        assert_eq!(report.total, 3);
        assert_eq!(report.fragments, 2);
    }

    #[test]
    fn all_matches_in_window_are_reported() {
        // Two earlier segments both end at seq 10 (a retransmission).
        let trace = vec![seg(0, 10), other(0, 30), seg(0, 10), seg(10, 1)];
        let report = detect(&trace, DetectOptions::default());
        assert_eq!(report.broken, 2);
        let preds: Vec<_> = report.matches.iter().map(|m| m.predecessor_index).collect();
        assert_eq!(preds, vec![0, 2]);
        assert_eq!(report.matches[0].separation, 2);
        assert_eq!(report.matches[1].separation, 0);
    }

    #[test]
    fn exclude_newest_skips_adjacent_predecessor() {
        let mut options = DetectOptions::default();
        options.exclude_newest = true;

        let adjacent = vec![seg(100, 50), seg(150, 3)];
        assert!(detect(&adjacent, options).matches.is_empty());

        let separated = vec![seg(100, 50), other(0, 20), seg(150, 3)];
        let report = detect(&separated, options);
        assert_eq!(report.matches.len(), 1);
        assert_eq!(report.matches[0].separation, 1);
    }

    #[test]
    fn interleaved_flows_do_not_cross_match() {
        // Same sequence numbers on two different flows.
        let trace = vec![seg(0, 10), other(0, 10), other(10, 2), seg(10, 2)];
        let report = detect(&trace, DetectOptions::default());
        assert_eq!(report.matches.len(), 2);
        assert_eq!(report.matches[0].index, 2);
        assert_eq!(report.matches[0].predecessor_index, 1);
        assert_eq!(report.matches[1].index, 3);
        assert_eq!(report.matches[1].predecessor_index, 0);
    }

    #[test]
    fn detection_is_idempotent_and_read_only() {
        let trace = vec![seg(0, 10), other(5, 20), seg(10, 3), other(25, 1)];
        let before = trace.clone();
        let first = detect(&trace, DetectOptions::default());
        let second = detect(&trace, DetectOptions::default());
        assert_eq!(first, second);
        assert_eq!(trace, before);
    }

    #[test]
    fn match_line_format() {
        let m = FragmentMatch {
            index: 7,
            predecessor_index: 4,
            seq: 150,
            predecessor_seq: 100,
            separation: 2,
            length: 3,
        };
        assert_eq!(
            m.to_string(),
            "Trace[7]: Found fragment TCP.seq=150 belonging to TCP.seq=100, separation: 2 packets, fragment length: 3"
        );
    }
}
