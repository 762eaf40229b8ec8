//! Zero-copy IPv6 header parser, including the extension header chain.
//!
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |Version| Traffic Class |           Flow Label                  |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |         Payload Length        |  Next Header  |   Hop Limit   |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    Source Address (128 bits)                  |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                 Destination Address (128 bits)                |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::{IpProtocol, ParseError};
use std::fmt;
use std::net::Ipv6Addr;

/// IPv6 fixed header length
pub const IPV6_HEADER_LEN: usize = 40;

/// Extension headers walked before giving up on the upper layer.
const MAX_EXTENSION_HEADERS: usize = 8;

const HOP_BY_HOP: u8 = 0;
const ROUTING: u8 = 43;
const FRAGMENT: u8 = 44;
const DESTINATION_OPTIONS: u8 = 60;
const FRAGMENT_HEADER_LEN: usize = 8;

/// Zero-copy IPv6 header.
#[derive(Debug)]
pub struct Ipv6Header<'a> {
    data: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < IPV6_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: IPV6_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = (data[0] >> 4) & 0x0F;
        if version != 6 {
            return Err(ParseError::InvalidHeader(format!(
                "expected IPv6 (version 6), got version {}",
                version
            )));
        }

        Ok(Ipv6Header { data })
    }

    /// Payload length (not including the 40-byte fixed header).
    #[inline]
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn next_header(&self) -> IpProtocol {
        IpProtocol::from(self.data[6])
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[8..24]);
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[24..40]);
        Ipv6Addr::from(octets)
    }

    /// Payload after the fixed IPv6 header, extension headers included.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let payload_len = self.payload_length() as usize;
        let available = self.data.len() - IPV6_HEADER_LEN;
        let end = IPV6_HEADER_LEN + payload_len.min(available);
        &self.data[IPV6_HEADER_LEN..end]
    }

    /// Skip Hop-by-Hop, Routing, Destination Options and Fragment headers and
    /// return the upper-layer protocol with its bytes.
    ///
    /// The protocol is `None` for a non-first fragment, a truncated chain or
    /// a chain of more than eight extension headers.
    pub fn upper_layer(&self) -> (Option<IpProtocol>, &'a [u8]) {
        let mut next = self.data[6];
        let mut rest = self.payload();
        for _ in 0..MAX_EXTENSION_HEADERS {
            let len = match next {
                HOP_BY_HOP | ROUTING | DESTINATION_OPTIONS => match rest.get(1) {
                    Some(&units) => (units as usize + 1) * 8,
                    None => return (None, rest),
                },
                FRAGMENT => {
                    if rest.len() < FRAGMENT_HEADER_LEN {
                        return (None, rest);
                    }
                    let offset = u16::from_be_bytes([rest[2], rest[3]]) >> 3;
                    if offset != 0 {
                        return (None, &rest[FRAGMENT_HEADER_LEN..]);
                    }
                    FRAGMENT_HEADER_LEN
                }
                proto => return (Some(IpProtocol::from(proto)), rest),
            };
            if rest.len() < len {
                return (None, rest);
            }
            next = rest[0];
            rest = &rest[len..];
        }
        (None, rest)
    }
}

impl<'a> fmt::Display for Ipv6Header<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} next_hdr={} len={}",
            self.src_addr(),
            self.dst_addr(),
            self.next_header(),
            self.payload_length()
        )
    }
}
