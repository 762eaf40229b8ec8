//! Link-layer framing for the capture link types we decode.
//!
//! Every supported framing is reduced to an EtherType plus the bytes of the
//! network-layer packet, so the IP parsers never see link headers.

use super::ethernet::EthernetHeader;
use super::{EtherType, ParseError};
use std::fmt;

/// Linux cooked capture (SLL) header length.
pub const SLL_HEADER_LEN: usize = 16;

/// BSD loopback / NULL header length (address family word).
pub const NULL_HEADER_LEN: usize = 4;

/// Link types understood by [`super::parse_frame`], keyed by the pcap
/// `LINKTYPE_*` value of the capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    Ethernet,
    Null,
    RawIp,
    LinuxSll,
    Unknown(i32),
}

impl From<i32> for LinkType {
    fn from(value: i32) -> Self {
        match value {
            1 => LinkType::Ethernet,
            0 | 108 => LinkType::Null,
            12 | 14 | 101 | 228 | 229 => LinkType::RawIp,
            113 => LinkType::LinuxSll,
            other => LinkType::Unknown(other),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkType::Ethernet => write!(f, "Ethernet"),
            LinkType::Null => write!(f, "BSD loopback"),
            LinkType::RawIp => write!(f, "raw IP"),
            LinkType::LinuxSll => write!(f, "Linux cooked"),
            LinkType::Unknown(v) => write!(f, "Unknown({})", v),
        }
    }
}

/// Strip the link header, returning the carried EtherType and the
/// network-layer bytes. A single 802.1Q tag is skipped.
pub fn strip_link_header(link: LinkType, data: &[u8]) -> Result<(EtherType, &[u8]), ParseError> {
    match link {
        LinkType::Ethernet => {
            let eth = EthernetHeader::parse(data)?;
            let remaining = eth.payload();
            let ether_type = eth.ether_type();
            if ether_type != EtherType::VlanTagged {
                return Ok((ether_type, remaining));
            }
            if remaining.len() < 4 {
                return Err(ParseError::TooShort {
                    expected: 4,
                    actual: remaining.len(),
                });
            }
            // Tag control word, then the inner EtherType.
            let inner = EtherType::from(u16::from_be_bytes([remaining[2], remaining[3]]));
            Ok((inner, &remaining[4..]))
        }
        LinkType::LinuxSll => {
            if data.len() < SLL_HEADER_LEN {
                return Err(ParseError::TooShort {
                    expected: SLL_HEADER_LEN,
                    actual: data.len(),
                });
            }
            let ether_type = EtherType::from(u16::from_be_bytes([data[14], data[15]]));
            Ok((ether_type, &data[SLL_HEADER_LEN..]))
        }
        LinkType::Null => {
            if data.len() < NULL_HEADER_LEN {
                return Err(ParseError::TooShort {
                    expected: NULL_HEADER_LEN,
                    actual: data.len(),
                });
            }
            // The family word is in the capturing host's byte order, so go by
            // the IP version nibble instead.
            let remaining = &data[NULL_HEADER_LEN..];
            Ok((ip_version_ether_type(remaining), remaining))
        }
        LinkType::RawIp => Ok((ip_version_ether_type(data), data)),
        LinkType::Unknown(v) => Err(ParseError::InvalidHeader(format!(
            "unsupported link type {}",
            v
        ))),
    }
}

fn ip_version_ether_type(data: &[u8]) -> EtherType {
    match data.first().map(|b| b >> 4) {
        Some(4) => EtherType::Ipv4,
        Some(6) => EtherType::Ipv6,
        _ => EtherType::Unknown(0),
    }
}
