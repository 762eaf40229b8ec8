//! End-to-end: write a classic pcap file, load it, detect and repair
//! fragments, write the result and read it back.

use fragscope::capture::{read_trace, write_trace};
use fragscope::fragment::{detect, repair, DetectOptions, RepairOptions};
use fragscope::protocol::LinkType;
use std::path::Path;

const CLIENT: [u8; 4] = [192, 168, 0, 10];
const SERVER: [u8; 4] = [192, 168, 0, 20];

/// Ethernet + IPv4 + TCP frame.
fn frame(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16, seq: u32, payload: &[u8]) -> Vec<u8> {
    let mut tcp = vec![0u8; 20];
    tcp[0..2].copy_from_slice(&sport.to_be_bytes());
    tcp[2..4].copy_from_slice(&dport.to_be_bytes());
    tcp[4..8].copy_from_slice(&seq.to_be_bytes());
    tcp[12] = 0x50;
    tcp[13] = 0x18;
    tcp[14..16].copy_from_slice(&8192u16.to_be_bytes());
    tcp.extend_from_slice(payload);

    let mut ip = vec![0u8; 20];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&((20 + tcp.len()) as u16).to_be_bytes());
    ip[8] = 64;
    ip[9] = 6;
    ip[12..16].copy_from_slice(&src);
    ip[16..20].copy_from_slice(&dst);
    ip.extend_from_slice(&tcp);

    let mut eth = vec![0u8; 14];
    eth[0..6].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x20]);
    eth[6..12].copy_from_slice(&[0x02, 0, 0, 0, 0, 0x10]);
    eth[12..14].copy_from_slice(&0x0800u16.to_be_bytes());
    eth.extend_from_slice(&ip);
    eth
}

/// Classic little-endian pcap file with microsecond timestamps.
fn write_pcap(path: &Path, linktype: u32, frames: &[Vec<u8>]) {
    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    out.extend_from_slice(&0i32.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    out.extend_from_slice(&65535u32.to_le_bytes());
    out.extend_from_slice(&linktype.to_le_bytes());
    for (i, data) in frames.iter().enumerate() {
        out.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        out.extend_from_slice(&(i as u32 * 1000).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
    }
    std::fs::write(path, out).unwrap();
}

fn sample_frames() -> Vec<Vec<u8>> {
    vec![
        // request header, 6 bytes
        frame(CLIENT, SERVER, 40000, 502, 100, b"\x00\x01\x00\x00\x00\x06"),
        // unrelated response
        frame(SERVER, CLIENT, 502, 40000, 900, b"\x00\x07\x00\x00\x00\x05\x01\x03\x02\x00\x2a"),
        // pure ACK, no payload
        frame(CLIENT, SERVER, 40000, 502, 106, b""),
        // rest of the request, separated by the response
        frame(CLIENT, SERVER, 40000, 502, 106, b"\x01\x03\x00"),
    ]
}

#[test]
fn detects_the_split_request() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.pcap");
    write_pcap(&input, 1, &sample_frames());

    let trace = read_trace(&input).unwrap();
    assert_eq!(trace.link_type(), LinkType::Ethernet);
    assert_eq!(trace.len(), 4);

    let report = detect(&trace.frames, DetectOptions::default());
    assert_eq!(report.total, 3);
    assert_eq!(report.fragments, 2);
    assert_eq!(report.broken, 1);
    let m = &report.matches[0];
    assert_eq!((m.index, m.predecessor_index), (3, 0));
    assert_eq!((m.seq, m.predecessor_seq), (106, 100));
    assert_eq!(m.separation, 1);
    assert_eq!(m.length, 3);
}

#[test]
fn repaired_trace_round_trips_through_pcap() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("in.pcap");
    let output = dir.path().join("out.pcap");
    let frames = sample_frames();
    write_pcap(&input, 1, &frames);

    let mut trace = read_trace(&input).unwrap();
    let report = repair(&mut trace.frames, RepairOptions::default());
    assert_eq!(report.reordered, 1);
    assert_eq!(report.moves[0].from, 3);
    assert_eq!(report.moves[0].to(), 1);
    write_trace(&output, &trace).unwrap();

    let repaired = read_trace(&output).unwrap();
    assert_eq!(repaired.linktype, trace.linktype);
    let data: Vec<&[u8]> = repaired.frames.iter().map(|f| f.data.as_slice()).collect();
    assert_eq!(
        data,
        vec![
            frames[0].as_slice(),
            frames[3].as_slice(),
            frames[1].as_slice(),
            frames[2].as_slice(),
        ]
    );
    // Record headers travel with their packets.
    let usecs: Vec<i64> = repaired
        .frames
        .iter()
        .map(|f| f.header.ts.tv_usec as i64)
        .collect();
    assert_eq!(usecs, vec![0, 3000, 1000, 2000]);

    // The fragment now directly follows its predecessor.
    let again = detect(&repaired.frames, DetectOptions::default());
    assert_eq!(again.total, 3);
    assert_eq!(again.broken, 1);
    assert_eq!(again.matches[0].separation, 0);
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_trace(&dir.path().join("missing.pcap")).is_err());
}
