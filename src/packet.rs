//! Owned, decoded view of a captured frame.
//!
//! The fragment engine never looks at raw bytes; it works on [`Packet`]
//! records whose headers and payload are each either present or absent.

use crate::flow::{Endpoint, FlowKey};
use crate::protocol::{self, LinkType, ParsedPacket, TransportHeader};
use std::net::IpAddr;

/// TCP header fields needed for flow identification and contiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpFields {
    pub src_port: u16,
    pub dst_port: u16,
    pub seq: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Packet {
    pub src_ip: Option<IpAddr>,
    pub dst_ip: Option<IpAddr>,
    pub tcp: Option<TcpFields>,
    /// Application data; `None` when the frame carried no bytes above the
    /// transport header.
    pub payload: Option<Vec<u8>>,
}

impl Packet {
    /// Decode a raw frame. A frame the protocol stack cannot parse becomes a
    /// packet with every field absent.
    pub fn decode(link: LinkType, data: &[u8]) -> Self {
        match protocol::parse_frame(link, data) {
            Ok(parsed) => Packet::from_parsed(&parsed),
            Err(e) => {
                tracing::trace!(error = %e, len = data.len(), "undecodable frame");
                Packet::default()
            }
        }
    }

    pub fn from_parsed(parsed: &ParsedPacket<'_>) -> Self {
        let (src_ip, dst_ip) = match &parsed.network {
            Some(net) => (Some(net.src_ip()), Some(net.dst_ip())),
            None => (None, None),
        };

        let (tcp, payload) = match &parsed.transport {
            Some(TransportHeader::Tcp(hdr)) => (
                Some(TcpFields {
                    src_port: hdr.src_port(),
                    dst_port: hdr.dst_port(),
                    seq: hdr.sequence_number(),
                }),
                non_empty(parsed.payload),
            ),
            Some(TransportHeader::Udp(_)) => (None, non_empty(parsed.payload)),
            None => (None, None),
        };

        Packet {
            src_ip,
            dst_ip,
            tcp,
            payload,
        }
    }

    /// Build a TCP data segment directly, without going through raw bytes.
    pub fn tcp_segment(src: Endpoint, dst: Endpoint, seq: u32, payload: &[u8]) -> Self {
        Packet {
            src_ip: Some(src.ip),
            dst_ip: Some(dst.ip),
            tcp: Some(TcpFields {
                src_port: src.port,
                dst_port: dst.port,
                seq,
            }),
            payload: non_empty(payload),
        }
    }

    #[inline]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    #[inline]
    pub fn payload_len(&self) -> Option<usize> {
        self.payload.as_ref().map(Vec::len)
    }

    #[inline]
    pub fn seq(&self) -> Option<u32> {
        self.tcp.map(|t| t.seq)
    }

    /// Directional flow key, present only when both IP and TCP headers are.
    pub fn flow_key(&self) -> Option<FlowKey> {
        let tcp = self.tcp?;
        Some(FlowKey::new(
            Endpoint {
                ip: self.src_ip?,
                port: tcp.src_port,
            },
            Endpoint {
                ip: self.dst_ip?,
                port: tcp.dst_port,
            },
        ))
    }
}

impl AsRef<Packet> for Packet {
    fn as_ref(&self) -> &Packet {
        self
    }
}

fn non_empty(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.is_empty() {
        None
    } else {
        Some(bytes.to_vec())
    }
}
