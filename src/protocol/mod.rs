pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod link;
pub mod tcp;
pub mod udp;

use std::fmt;
use std::net::IpAddr;

pub use link::LinkType;

/// EtherType constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    VlanTagged,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            0x8100 => EtherType::VlanTagged,
            other => EtherType::Unknown(other),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Ipv6 => write!(f, "IPv6"),
            EtherType::VlanTagged => write!(f, "802.1Q VLAN"),
            EtherType::Unknown(v) => write!(f, "Unknown(0x{:04x})", v),
        }
    }
}

/// IP Protocol numbers (subset relevant to our use case)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Unknown(v) => write!(f, "Proto({})", v),
        }
    }
}

/// Errors from protocol parsing
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Not enough bytes to parse the header
    #[error("packet too short: need {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    /// Invalid header values
    #[error("invalid header: {0}")]
    InvalidHeader(String),
}

/// A parsed frame, referencing the original byte slice.
///
/// `payload` is whatever follows the innermost recognised header; callers
/// decide whether it counts as application data.
#[derive(Debug)]
pub struct ParsedPacket<'a> {
    pub network: Option<NetworkHeader<'a>>,
    pub transport: Option<TransportHeader<'a>>,
    pub payload: &'a [u8],
}

/// Network layer header
#[derive(Debug)]
pub enum NetworkHeader<'a> {
    Ipv4(ipv4::Ipv4Header<'a>),
    Ipv6(ipv6::Ipv6Header<'a>),
}

impl<'a> NetworkHeader<'a> {
    pub fn src_ip(&self) -> IpAddr {
        match self {
            NetworkHeader::Ipv4(h) => IpAddr::V4(h.src_addr()),
            NetworkHeader::Ipv6(h) => IpAddr::V6(h.src_addr()),
        }
    }

    pub fn dst_ip(&self) -> IpAddr {
        match self {
            NetworkHeader::Ipv4(h) => IpAddr::V4(h.dst_addr()),
            NetworkHeader::Ipv6(h) => IpAddr::V6(h.dst_addr()),
        }
    }

    pub fn protocol(&self) -> IpProtocol {
        match self {
            NetworkHeader::Ipv4(h) => h.protocol(),
            NetworkHeader::Ipv6(h) => h.next_header(),
        }
    }
}

/// Transport layer header
#[derive(Debug)]
pub enum TransportHeader<'a> {
    Tcp(tcp::TcpHeader<'a>),
    Udp(udp::UdpHeader<'a>),
}

/// Parse a captured frame of the given link type.
/// This is the main entry point for the protocol stack.
pub fn parse_frame(link: LinkType, data: &[u8]) -> Result<ParsedPacket<'_>, ParseError> {
    let (ether_type, remaining) = link::strip_link_header(link, data)?;

    // Layer 3: Network
    let (network, l4_data, ip_proto) = match ether_type {
        EtherType::Ipv4 => {
            let hdr = ipv4::Ipv4Header::parse(remaining)?;
            let proto = hdr.protocol();
            let payload = hdr.payload();
            // Non-initial IP fragments carry no transport header.
            let proto = if hdr.fragment_offset() != 0 {
                None
            } else {
                Some(proto)
            };
            (Some(NetworkHeader::Ipv4(hdr)), payload, proto)
        }
        EtherType::Ipv6 => {
            let hdr = ipv6::Ipv6Header::parse(remaining)?;
            let (proto, payload) = hdr.upper_layer();
            (Some(NetworkHeader::Ipv6(hdr)), payload, proto)
        }
        _ => (None, remaining, None),
    };

    // Layer 4: Transport
    let (transport, payload) = match ip_proto {
        Some(IpProtocol::Tcp) => match tcp::TcpHeader::parse(l4_data) {
            Ok(hdr) => {
                let payload = hdr.payload();
                (Some(TransportHeader::Tcp(hdr)), payload)
            }
            Err(_) => (None, l4_data),
        },
        Some(IpProtocol::Udp) => match udp::UdpHeader::parse(l4_data) {
            Ok(hdr) => {
                let payload = hdr.payload();
                (Some(TransportHeader::Udp(hdr)), payload)
            }
            Err(_) => (None, l4_data),
        },
        _ => (None, l4_data),
    };

    Ok(ParsedPacket {
        network,
        transport,
        payload,
    })
}
