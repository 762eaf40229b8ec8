//! Zero-copy TCP header parser.
//!
//! TCP header layout (20-60 bytes):
//!   0                   1                   2                   3
//!   0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |          Source Port          |       Destination Port        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                        Sequence Number                       |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |                    Acknowledgment Number                     |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |  Data |           |U|A|P|R|S|F|                               |
//!  | Offset| Reserved  |R|C|S|S|Y|I|            Window             |
//!  |       |           |G|K|H|T|N|N|                               |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!  |           Checksum            |         Urgent Pointer        |
//!  +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+

use super::ParseError;
use std::fmt;

/// Minimum TCP header length (no options)
pub const TCP_MIN_HEADER_LEN: usize = 20;

/// TCP flags bitmask constants
pub mod flags {
    pub const FIN: u8 = 0x01;
    pub const SYN: u8 = 0x02;
    pub const RST: u8 = 0x04;
    pub const PSH: u8 = 0x08;
    pub const ACK: u8 = 0x10;
}

/// Zero-copy TCP header.
#[derive(Debug)]
pub struct TcpHeader<'a> {
    data: &'a [u8],
    header_len: usize,
}

impl<'a> TcpHeader<'a> {
    /// Parse a TCP header from a byte slice.
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < TCP_MIN_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: TCP_MIN_HEADER_LEN,
                actual: data.len(),
            });
        }

        let data_offset = ((data[12] >> 4) & 0x0F) as usize;
        let header_len = data_offset * 4;

        if header_len < TCP_MIN_HEADER_LEN {
            return Err(ParseError::InvalidHeader(format!(
                "TCP data offset too small: {} (min 5)",
                data_offset
            )));
        }

        if data.len() < header_len {
            return Err(ParseError::TooShort {
                expected: header_len,
                actual: data.len(),
            });
        }

        Ok(TcpHeader { data, header_len })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    #[inline]
    pub fn sequence_number(&self) -> u32 {
        u32::from_be_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
    }

    /// Header length in bytes.
    #[inline]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    #[inline]
    pub fn flags_raw(&self) -> u8 {
        self.data[13]
    }

    /// Format flags as a string like "[PSH, ACK]".
    pub fn flags_string(&self) -> String {
        let names = [
            (flags::SYN, "SYN"),
            (flags::ACK, "ACK"),
            (flags::FIN, "FIN"),
            (flags::RST, "RST"),
            (flags::PSH, "PSH"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(bit, _)| self.flags_raw() & bit != 0)
            .map(|(_, name)| *name)
            .collect();
        format!("[{}]", parts.join(", "))
    }

    /// Payload after the TCP header.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[self.header_len..]
    }
}

impl<'a> fmt::Display for TcpHeader<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ":{} -> :{} {} seq={}",
            self.src_port(),
            self.dst_port(),
            self.flags_string(),
            self.sequence_number(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tcp_psh(payload: &[u8]) -> Vec<u8> {
        let mut pkt = vec![0u8; 20];
        pkt[0] = 0xC0;
        pkt[1] = 0x00; // src port = 49152
        pkt[3] = 0xF6; // dst port = 502 (Modbus/TCP)
        pkt[2] = 0x01;
        pkt[4..8].copy_from_slice(&1000u32.to_be_bytes());
        pkt[12] = 0x50;
        pkt[13] = flags::PSH | flags::ACK;
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn parse_tcp_with_payload() {
        let pkt = make_tcp_psh(b"\x00\x01\x00");
        let hdr = TcpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.src_port(), 49152);
        assert_eq!(hdr.dst_port(), 502);
        assert_eq!(hdr.sequence_number(), 1000);
        assert_eq!(hdr.header_len(), 20);
        assert_eq!(hdr.flags_string(), "[ACK, PSH]");
        assert_eq!(hdr.payload(), b"\x00\x01\x00");
    }

    #[test]
    fn options_are_not_payload() {
        let mut pkt = make_tcp_psh(b"");
        pkt[12] = 0x60; // 24-byte header
        pkt.extend_from_slice(&[1, 1, 1, 0]); // NOP NOP NOP EOL
        let hdr = TcpHeader::parse(&pkt).unwrap();
        assert_eq!(hdr.header_len(), 24);
        assert!(hdr.payload().is_empty());
    }

    #[test]
    fn reject_short_tcp() {
        let pkt = [0u8; 19];
        assert!(TcpHeader::parse(&pkt).is_err());
    }

    #[test]
    fn reject_bad_data_offset() {
        let mut pkt = make_tcp_psh(b"");
        pkt[12] = 0x40;
        assert!(TcpHeader::parse(&pkt).is_err());
    }
}
