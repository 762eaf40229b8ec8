//! Zero-copy Ethernet II header view.
//!
//!   - Destination MAC: 6 bytes
//!   - Source MAC:      6 bytes
//!   - EtherType:       2 bytes
//!
//! 802.1Q tags are unwrapped by the caller in `link`.

use super::{EtherType, ParseError};

/// Ethernet header length without VLAN tags
pub const ETH_HEADER_LEN: usize = 14;

/// Zero-copy Ethernet header that borrows from the frame buffer.
#[derive(Debug)]
pub struct EthernetHeader<'a> {
    data: &'a [u8],
}

impl<'a> EthernetHeader<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < ETH_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: ETH_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(EthernetHeader { data })
    }

    #[inline]
    pub fn dst_mac(&self) -> &'a [u8] {
        &self.data[0..6]
    }

    #[inline]
    pub fn src_mac(&self) -> &'a [u8] {
        &self.data[6..12]
    }

    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(u16::from_be_bytes([self.data[12], self.data[13]]))
    }

    /// Bytes after the Ethernet header, including any link trailer.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[ETH_HEADER_LEN..]
    }
}
