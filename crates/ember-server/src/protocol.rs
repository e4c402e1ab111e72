//! The wire protocol.
//!
//! Requests start with a fixed 9-byte packed header, little-endian, no
//! padding:
//!
//! ```text
//! offset 0  u8   msg_type   (0 = GET, 1 = SET)
//! offset 1  u32  page_no
//! offset 5  u32  page_size
//! ```
//!
//! A SET carries `page_size` payload bytes after the header and is
//! answered with the 4-byte `page_size` echoed back. A GET has no payload
//! and is answered with the 4-byte `page_size` followed by `page_size`
//! payload bytes. There is no error code on the wire; framing is
//! preserved even when the underlying page operation fails.

use bytes::{Buf, BufMut};
use ember_common::types::PageId;

/// Size of the request header in bytes.
pub const HEADER_SIZE: usize = 9;

/// Size of the length echo that starts every response.
pub const SIZE_ECHO_LEN: usize = 4;

/// Request message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// Read a page.
    Get = 0,
    /// Write a page.
    Set = 1,
}

impl MsgType {
    /// Returns the wire value.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parses a wire value; unknown values return `None`.
    #[inline]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Get),
            1 => Some(Self::Set),
            _ => None,
        }
    }
}

/// The fixed 9-byte request header.
///
/// `msg_type` is kept raw so a header with an unknown type still decodes;
/// the server logs it and reads the next header without responding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    /// Raw message type byte.
    pub msg_type: u8,
    /// Page number the request addresses.
    pub page_no: PageId,
    /// Page size in bytes; also the SET payload length.
    pub page_size: u32,
}

impl RequestHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = HEADER_SIZE;

    /// Creates a header for a known message type.
    pub fn new(msg_type: MsgType, page_no: PageId, page_size: u32) -> Self {
        Self {
            msg_type: msg_type.as_u8(),
            page_no,
            page_size,
        }
    }

    /// Returns the message type, or `None` for an unknown wire value.
    #[inline]
    pub fn kind(&self) -> Option<MsgType> {
        MsgType::from_u8(self.msg_type)
    }

    /// Serializes the header.
    pub fn encode(&self, buf: &mut impl BufMut) {
        buf.put_u8(self.msg_type);
        buf.put_u32_le(self.page_no.as_u32());
        buf.put_u32_le(self.page_size);
    }

    /// Serializes the header to a byte array.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let mut cursor = &mut buf[..];
        self.encode(&mut cursor);
        buf
    }

    /// Deserializes a header from its 9 wire bytes.
    pub fn decode(bytes: &[u8; Self::SIZE]) -> Self {
        let mut buf = &bytes[..];
        let msg_type = buf.get_u8();
        let page_no = PageId::new(buf.get_u32_le());
        let page_size = buf.get_u32_le();
        Self {
            msg_type,
            page_no,
            page_size,
        }
    }
}

/// Encodes the 4-byte size echo that starts every response.
#[inline]
pub fn encode_size_echo(page_size: u32) -> [u8; SIZE_ECHO_LEN] {
    page_size.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = RequestHeader::new(MsgType::Set, PageId::new(0x0403_0201), 0x0807_0605);
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(bytes[0], 1);
        // Little-endian page_no at offset 1, page_size at offset 5.
        assert_eq!(&bytes[1..5], &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(&bytes[5..9], &[0x05, 0x06, 0x07, 0x08]);
    }

    #[test]
    fn test_header_roundtrip() {
        let header = RequestHeader::new(MsgType::Get, PageId::new(42), 8192);
        let decoded = RequestHeader::decode(&header.to_bytes());
        assert_eq!(decoded, header);
        assert_eq!(decoded.kind(), Some(MsgType::Get));
    }

    #[test]
    fn test_unknown_msg_type_still_decodes() {
        let mut bytes = RequestHeader::new(MsgType::Get, PageId::new(1), 16).to_bytes();
        bytes[0] = 7;

        let decoded = RequestHeader::decode(&bytes);
        assert_eq!(decoded.kind(), None);
        assert_eq!(decoded.page_no, PageId::new(1));
        assert_eq!(decoded.page_size, 16);
    }

    #[test]
    fn test_msg_type_values() {
        assert_eq!(MsgType::Get.as_u8(), 0);
        assert_eq!(MsgType::Set.as_u8(), 1);
        assert_eq!(MsgType::from_u8(0), Some(MsgType::Get));
        assert_eq!(MsgType::from_u8(1), Some(MsgType::Set));
        assert_eq!(MsgType::from_u8(2), None);
    }

    #[test]
    fn test_size_echo_is_little_endian() {
        assert_eq!(encode_size_echo(0x0403_0201), [0x01, 0x02, 0x03, 0x04]);
    }
}
