//! RPKI-to-Router (RTR) Protocol Parser
//!
//! Parsing and encoding of RTR PDUs as defined in RFC 6810 (v0) and RFC 8210 (v1).
//!
//! # Parsing
//!
//! ```rust
//! use rpki_rtr_client::parser::rpki::rtr::parse_rtr_pdu;
//! use rpki_rtr_client::models::rpki::rtr::*;
//!
//! // Cache Response, session 7
//! let bytes = [0, 3, 0, 7, 0, 0, 0, 8];
//! let (pdu, consumed) = parse_rtr_pdu(&bytes).unwrap();
//! assert_eq!(consumed, 8);
//! assert!(matches!(pdu, RtrPdu::CacheResponse(r) if r.session_id == 7));
//! ```
//!
//! # Encoding
//!
//! ```rust
//! use rpki_rtr_client::parser::rpki::rtr::RtrEncode;
//! use rpki_rtr_client::models::rpki::rtr::*;
//!
//! let query = RtrResetQuery::new(RtrProtocolVersion::V0);
//! assert_eq!(&query.encode()[..], &[0, 2, 0, 0, 0, 0, 0, 8]);
//! ```

use crate::models::rpki::rtr::*;
use crate::models::{Afi, Asn};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use ipnet::{Ipv4Net, Ipv6Net};
use std::fmt;
use std::io::{self, Read};
use std::net::{Ipv4Addr, Ipv6Addr};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during RTR PDU parsing
#[derive(Debug)]
pub enum RtrError {
    /// I/O error during reading
    IoError(io::Error),
    /// PDU is incomplete (need more data). This is the normal partial-read
    /// condition, not a protocol failure.
    IncompletePdu {
        /// Number of bytes available
        available: usize,
        /// Number of bytes needed
        needed: usize,
    },
    /// PDU type is not one this client models
    InvalidPduType(u8),
    /// Invalid protocol version
    InvalidProtocolVersion(u8),
    /// Invalid PDU length
    InvalidLength {
        /// Expected length
        expected: u32,
        /// Actual length in header
        actual: u32,
        /// PDU type
        pdu_type: u8,
    },
    /// Invalid prefix length
    InvalidPrefixLength {
        prefix_len: u8,
        max_len: u8,
        /// 32 for IPv4, 128 for IPv6
        max_allowed: u8,
    },
    /// Header advertises a PDU larger than the configured maximum
    PduTooLarge {
        length: u32,
        max: usize,
    },
}

impl RtrError {
    /// True for the "wait for more bytes" condition.
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RtrError::IncompletePdu { .. })
    }
}

impl fmt::Display for RtrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtrError::IoError(e) => write!(f, "I/O error: {}", e),
            RtrError::IncompletePdu { available, needed } => {
                write!(
                    f,
                    "Incomplete PDU: have {} bytes, need {} bytes",
                    available, needed
                )
            }
            RtrError::InvalidPduType(t) => write!(f, "Unknown PDU type: {}", t),
            RtrError::InvalidProtocolVersion(v) => write!(f, "Invalid protocol version: {}", v),
            RtrError::InvalidLength {
                expected,
                actual,
                pdu_type,
            } => {
                write!(
                    f,
                    "Invalid length for PDU type {}: expected {}, got {}",
                    pdu_type, expected, actual
                )
            }
            RtrError::InvalidPrefixLength {
                prefix_len,
                max_len,
                max_allowed,
            } => {
                write!(
                    f,
                    "Invalid prefix length: prefix_len={}, max_len={}, max_allowed={}",
                    prefix_len, max_len, max_allowed
                )
            }
            RtrError::PduTooLarge { length, max } => {
                write!(f, "PDU length {} exceeds maximum of {} bytes", length, max)
            }
        }
    }
}

impl std::error::Error for RtrError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RtrError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for RtrError {
    fn from(e: io::Error) -> Self {
        RtrError::IoError(e)
    }
}

// =============================================================================
// PDU Length Constants
// =============================================================================

/// RTR PDU header length (common to all PDUs)
pub const RTR_HEADER_LEN: usize = 8;

pub const RTR_SERIAL_NOTIFY_LEN: u32 = 12;
pub const RTR_SERIAL_QUERY_LEN: u32 = 12;
pub const RTR_RESET_QUERY_LEN: u32 = 8;
pub const RTR_CACHE_RESPONSE_LEN: u32 = 8;
pub const RTR_IPV4_PREFIX_LEN: u32 = 20;
pub const RTR_IPV6_PREFIX_LEN: u32 = 32;
pub const RTR_END_OF_DATA_V0_LEN: u32 = 12;
pub const RTR_END_OF_DATA_V1_LEN: u32 = 24;

// =============================================================================
// Header
// =============================================================================

/// The fixed 8-byte header present in every PDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtrHeader {
    pub version: u8,
    pub pdu_type: u8,
    /// Session id for most types; type-specific otherwise.
    pub session_or_field: u16,
    /// Total PDU length including the header.
    pub length: u32,
}

impl RtrHeader {
    #[inline]
    pub fn pdu_len(&self) -> usize {
        self.length as usize
    }

    /// Reject a header advertising more than `max` bytes; `None` accepts any length.
    pub fn check_max_len(&self, max: Option<usize>) -> Result<(), RtrError> {
        match max {
            Some(max) if self.pdu_len() > max => Err(RtrError::PduTooLarge {
                length: self.length,
                max,
            }),
            _ => Ok(()),
        }
    }
}

/// Parse the fixed header at the front of `input`.
///
/// Fails with [`RtrError::IncompletePdu`] when fewer than 8 bytes are available, and
/// with [`RtrError::InvalidLength`] when the advertised length is shorter than the
/// header itself.
pub fn parse_rtr_header(input: &[u8]) -> Result<RtrHeader, RtrError> {
    if input.len() < RTR_HEADER_LEN {
        return Err(RtrError::IncompletePdu {
            available: input.len(),
            needed: RTR_HEADER_LEN,
        });
    }

    let mut buf = &input[..RTR_HEADER_LEN];
    let header = RtrHeader {
        version: buf.get_u8(),
        pdu_type: buf.get_u8(),
        session_or_field: buf.get_u16(),
        length: buf.get_u32(),
    };

    if header.pdu_len() < RTR_HEADER_LEN {
        return Err(RtrError::InvalidLength {
            expected: RTR_HEADER_LEN as u32,
            actual: header.length,
            pdu_type: header.pdu_type,
        });
    }

    Ok(header)
}

// =============================================================================
// Parsing Functions
// =============================================================================

/// Parse a single RTR PDU from the front of a byte slice.
///
/// Returns the parsed PDU and the number of bytes consumed. Bytes past the
/// advertised length are left alone.
///
/// # Errors
///
/// [`RtrError::IncompletePdu`] when the slice is shorter than the header or the
/// advertised length; any other variant means the PDU itself is bad.
pub fn parse_rtr_pdu(input: &[u8]) -> Result<(RtrPdu, usize), RtrError> {
    let header = parse_rtr_header(input)?;
    let length = header.pdu_len();

    if input.len() < length {
        return Err(RtrError::IncompletePdu {
            available: input.len(),
            needed: length,
        });
    }

    let pdu_type = RtrPduType::try_from(header.pdu_type)
        .map_err(|_| RtrError::InvalidPduType(header.pdu_type))?;
    let version = RtrProtocolVersion::try_from(header.version)
        .map_err(|_| RtrError::InvalidProtocolVersion(header.version))?;

    let mut payload = &input[RTR_HEADER_LEN..length];

    let pdu = match pdu_type {
        RtrPduType::SerialNotify => {
            validate_length(&header, RTR_SERIAL_NOTIFY_LEN)?;
            RtrPdu::SerialNotify(RtrSerialNotify {
                version,
                session_id: header.session_or_field,
                serial_number: payload.get_u32(),
            })
        }
        RtrPduType::SerialQuery => {
            validate_length(&header, RTR_SERIAL_QUERY_LEN)?;
            RtrPdu::SerialQuery(RtrSerialQuery {
                version,
                session_id: header.session_or_field,
                serial_number: payload.get_u32(),
            })
        }
        RtrPduType::ResetQuery => {
            validate_length(&header, RTR_RESET_QUERY_LEN)?;
            RtrPdu::ResetQuery(RtrResetQuery { version })
        }
        RtrPduType::CacheResponse => {
            validate_length(&header, RTR_CACHE_RESPONSE_LEN)?;
            RtrPdu::CacheResponse(RtrCacheResponse {
                version,
                session_id: header.session_or_field,
            })
        }
        RtrPduType::IPv4Prefix => {
            validate_length(&header, RTR_IPV4_PREFIX_LEN)?;
            RtrPdu::IPv4Prefix(parse_ipv4_prefix(version, payload)?)
        }
        RtrPduType::IPv6Prefix => {
            validate_length(&header, RTR_IPV6_PREFIX_LEN)?;
            RtrPdu::IPv6Prefix(parse_ipv6_prefix(version, payload)?)
        }
        RtrPduType::EndOfData => {
            let expected_len = match version {
                RtrProtocolVersion::V0 => RTR_END_OF_DATA_V0_LEN,
                RtrProtocolVersion::V1 => RTR_END_OF_DATA_V1_LEN,
            };
            validate_length(&header, expected_len)?;
            RtrPdu::EndOfData(parse_end_of_data(version, header.session_or_field, payload))
        }
    };

    Ok((pdu, length))
}

/// Read a single RTR PDU from a blocking reader.
///
/// The body is only read once the header passes the `max_pdu_len` check, so a
/// bogus length field never turns into a large allocation.
///
/// # Example
///
/// ```rust,no_run
/// use std::net::TcpStream;
/// use rpki_rtr_client::parser::rpki::rtr::read_rtr_pdu;
/// use rpki_rtr_client::parser::rpki::stream::DEFAULT_MAX_PDU_LEN;
///
/// let mut stream = TcpStream::connect("rtr.example.com:323").unwrap();
/// let pdu = read_rtr_pdu(&mut stream, Some(DEFAULT_MAX_PDU_LEN)).unwrap();
/// ```
pub fn read_rtr_pdu<R: Read>(
    reader: &mut R,
    max_pdu_len: Option<usize>,
) -> Result<RtrPdu, RtrError> {
    let mut header_bytes = [0u8; RTR_HEADER_LEN];
    reader.read_exact(&mut header_bytes)?;
    let header = parse_rtr_header(&header_bytes)?;
    header.check_max_len(max_pdu_len)?;

    let mut buffer = vec![0u8; header.pdu_len()];
    buffer[..RTR_HEADER_LEN].copy_from_slice(&header_bytes);
    reader.read_exact(&mut buffer[RTR_HEADER_LEN..])?;

    let (pdu, _) = parse_rtr_pdu(&buffer)?;
    Ok(pdu)
}

fn parse_ipv4_prefix(
    version: RtrProtocolVersion,
    mut payload: &[u8],
) -> Result<RtrIPv4Prefix, RtrError> {
    let flags = RtrPrefixFlags::from_bits_retain(payload.get_u8());
    let prefix_length = payload.get_u8();
    let max_length = payload.get_u8();
    payload.advance(1); // zero

    validate_prefix_length(prefix_length, max_length, Afi::Ipv4)?;

    let address = Ipv4Addr::from(payload.get_u32());
    let prefix = Ipv4Net::new(address, prefix_length)
        .map_err(|_| RtrError::InvalidPrefixLength {
            prefix_len: prefix_length,
            max_len: max_length,
            max_allowed: Afi::Ipv4.max_prefix_len(),
        })?
        .trunc()
        .addr();

    Ok(RtrIPv4Prefix {
        version,
        flags,
        prefix_length,
        max_length,
        prefix,
        asn: Asn::new(payload.get_u32()),
    })
}

fn parse_ipv6_prefix(
    version: RtrProtocolVersion,
    mut payload: &[u8],
) -> Result<RtrIPv6Prefix, RtrError> {
    let flags = RtrPrefixFlags::from_bits_retain(payload.get_u8());
    let prefix_length = payload.get_u8();
    let max_length = payload.get_u8();
    payload.advance(1); // zero

    validate_prefix_length(prefix_length, max_length, Afi::Ipv6)?;

    let address = Ipv6Addr::from(payload.get_u128());
    let prefix = Ipv6Net::new(address, prefix_length)
        .map_err(|_| RtrError::InvalidPrefixLength {
            prefix_len: prefix_length,
            max_len: max_length,
            max_allowed: Afi::Ipv6.max_prefix_len(),
        })?
        .trunc()
        .addr();

    Ok(RtrIPv6Prefix {
        version,
        flags,
        prefix_length,
        max_length,
        prefix,
        asn: Asn::new(payload.get_u32()),
    })
}

fn parse_end_of_data(
    version: RtrProtocolVersion,
    session_id: u16,
    mut payload: &[u8],
) -> RtrEndOfData {
    let serial_number = payload.get_u32();
    let (refresh_interval, retry_interval, expire_interval) = match version {
        RtrProtocolVersion::V0 => (None, None, None),
        RtrProtocolVersion::V1 => {
            let refresh = payload.get_u32();
            let retry = payload.get_u32();
            let expire = payload.get_u32();
            (Some(refresh), Some(retry), Some(expire))
        }
    };

    RtrEndOfData {
        version,
        session_id,
        serial_number,
        refresh_interval,
        retry_interval,
        expire_interval,
    }
}

fn validate_length(header: &RtrHeader, expected: u32) -> Result<(), RtrError> {
    if header.length != expected {
        Err(RtrError::InvalidLength {
            expected,
            actual: header.length,
            pdu_type: header.pdu_type,
        })
    } else {
        Ok(())
    }
}

fn validate_prefix_length(prefix_len: u8, max_len: u8, afi: Afi) -> Result<(), RtrError> {
    let max_allowed = afi.max_prefix_len();
    if prefix_len > max_len || max_len > max_allowed {
        Err(RtrError::InvalidPrefixLength {
            prefix_len,
            max_len,
            max_allowed,
        })
    } else {
        Ok(())
    }
}

// =============================================================================
// Encoding Trait and Implementations
// =============================================================================

/// Trait for encoding RTR PDUs to bytes
pub trait RtrEncode {
    fn encode(&self) -> Bytes;
}

fn put_header(
    buf: &mut BytesMut,
    version: RtrProtocolVersion,
    pdu_type: RtrPduType,
    field: u16,
    length: u32,
) {
    buf.put_u8(version.into());
    buf.put_u8(pdu_type.into());
    buf.put_u16(field);
    buf.put_u32(length);
}

impl RtrEncode for RtrSerialNotify {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_SERIAL_NOTIFY_LEN as usize);
        put_header(
            &mut buf,
            self.version,
            RtrPduType::SerialNotify,
            self.session_id,
            RTR_SERIAL_NOTIFY_LEN,
        );
        buf.put_u32(self.serial_number);
        buf.freeze()
    }
}

impl RtrEncode for RtrSerialQuery {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_SERIAL_QUERY_LEN as usize);
        put_header(
            &mut buf,
            self.version,
            RtrPduType::SerialQuery,
            self.session_id,
            RTR_SERIAL_QUERY_LEN,
        );
        buf.put_u32(self.serial_number);
        buf.freeze()
    }
}

impl RtrEncode for RtrResetQuery {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_RESET_QUERY_LEN as usize);
        put_header(&mut buf, self.version, RtrPduType::ResetQuery, 0, RTR_RESET_QUERY_LEN);
        buf.freeze()
    }
}

impl RtrEncode for RtrCacheResponse {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_CACHE_RESPONSE_LEN as usize);
        put_header(
            &mut buf,
            self.version,
            RtrPduType::CacheResponse,
            self.session_id,
            RTR_CACHE_RESPONSE_LEN,
        );
        buf.freeze()
    }
}

impl RtrEncode for RtrIPv4Prefix {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_IPV4_PREFIX_LEN as usize);
        put_header(&mut buf, self.version, RtrPduType::IPv4Prefix, 0, RTR_IPV4_PREFIX_LEN);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.prefix_length);
        buf.put_u8(self.max_length);
        buf.put_u8(0);
        buf.put_slice(&self.prefix.octets());
        buf.put_u32(self.asn.to_u32());
        buf.freeze()
    }
}

impl RtrEncode for RtrIPv6Prefix {
    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RTR_IPV6_PREFIX_LEN as usize);
        put_header(&mut buf, self.version, RtrPduType::IPv6Prefix, 0, RTR_IPV6_PREFIX_LEN);
        buf.put_u8(self.flags.bits());
        buf.put_u8(self.prefix_length);
        buf.put_u8(self.max_length);
        buf.put_u8(0);
        buf.put_slice(&self.prefix.octets());
        buf.put_u32(self.asn.to_u32());
        buf.freeze()
    }
}

impl RtrEncode for RtrEndOfData {
    fn encode(&self) -> Bytes {
        let length = match self.version {
            RtrProtocolVersion::V0 => RTR_END_OF_DATA_V0_LEN,
            RtrProtocolVersion::V1 => RTR_END_OF_DATA_V1_LEN,
        };
        let mut buf = BytesMut::with_capacity(length as usize);
        put_header(&mut buf, self.version, RtrPduType::EndOfData, self.session_id, length);
        buf.put_u32(self.serial_number);

        if self.version == RtrProtocolVersion::V1 {
            buf.put_u32(self.refresh_interval.unwrap_or(RtrEndOfData::DEFAULT_REFRESH));
            buf.put_u32(self.retry_interval.unwrap_or(RtrEndOfData::DEFAULT_RETRY));
            buf.put_u32(self.expire_interval.unwrap_or(RtrEndOfData::DEFAULT_EXPIRE));
        }
        buf.freeze()
    }
}

impl RtrEncode for RtrPdu {
    fn encode(&self) -> Bytes {
        match self {
            RtrPdu::SerialNotify(p) => p.encode(),
            RtrPdu::SerialQuery(p) => p.encode(),
            RtrPdu::ResetQuery(p) => p.encode(),
            RtrPdu::CacheResponse(p) => p.encode(),
            RtrPdu::IPv4Prefix(p) => p.encode(),
            RtrPdu::IPv6Prefix(p) => p.encode(),
            RtrPdu::EndOfData(p) => p.encode(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_query_roundtrip() {
        let query = RtrResetQuery::new(RtrProtocolVersion::V0);
        let bytes = query.encode();
        assert_eq!(&bytes[..], &[0, 2, 0, 0, 0, 0, 0, 8]);

        let (pdu, consumed) = parse_rtr_pdu(&bytes).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(pdu, RtrPdu::ResetQuery(query));
    }

    #[test]
    fn test_serial_query_roundtrip() {
        let query = RtrSerialQuery::new(RtrProtocolVersion::V0, 7, 5);
        let bytes = query.encode();
        assert_eq!(&bytes[..], &[0, 1, 0, 7, 0, 0, 0, 12, 0, 0, 0, 5]);

        let (pdu, consumed) = parse_rtr_pdu(&bytes).unwrap();
        assert_eq!(consumed, 12);
        match pdu {
            RtrPdu::SerialQuery(q) => {
                assert_eq!(q.version, RtrProtocolVersion::V0);
                assert_eq!(q.session_id, 7);
                assert_eq!(q.serial_number, 5);
            }
            _ => panic!("Expected SerialQuery"),
        }
    }

    #[test]
    fn test_header_decode() {
        let header = parse_rtr_header(&[1, 7, 0x12, 0x34, 0, 0, 0, 24, 0xff]).unwrap();
        assert_eq!(header.version, 1);
        assert_eq!(header.pdu_type, 7);
        assert_eq!(header.session_or_field, 0x1234);
        assert_eq!(header.length, 24);

        let err = parse_rtr_header(&[0, 3, 0]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_header_length_below_header_size() {
        let err = parse_rtr_pdu(&[0, 2, 0, 0, 0, 0, 0, 4]).unwrap_err();
        assert!(matches!(err, RtrError::InvalidLength { actual: 4, .. }));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_cache_response_decode() {
        let (pdu, consumed) = parse_rtr_pdu(&[0, 3, 0, 7, 0, 0, 0, 8]).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(
            pdu,
            RtrPdu::CacheResponse(RtrCacheResponse {
                version: RtrProtocolVersion::V0,
                session_id: 7,
            })
        );
    }

    #[test]
    fn test_ipv4_prefix_decode() {
        let bytes = [
            0, 4, 0, 0, 0, 0, 0, 20, // header
            1, 24, 24, 0, // flags, prefix len, max len, zero
            10, 0, 0, 0, // prefix
            0, 0, 0xFD, 0xE8, // asn 65000
        ];
        let (pdu, consumed) = parse_rtr_pdu(&bytes).unwrap();
        assert_eq!(consumed, 20);
        match pdu {
            RtrPdu::IPv4Prefix(p) => {
                assert!(p.is_announcement());
                assert_eq!(p.prefix_length, 24);
                assert_eq!(p.max_length, 24);
                assert_eq!(p.prefix, Ipv4Addr::new(10, 0, 0, 0));
                assert_eq!(p.asn, 65000);
            }
            _ => panic!("Expected IPv4Prefix"),
        }
    }

    #[test]
    fn test_ipv4_prefix_is_masked() {
        let bytes = [
            0, 4, 0, 0, 0, 0, 0, 20, //
            0, 12, 16, 0, //
            10, 255, 1, 2, //
            0, 0, 0, 1,
        ];
        let (pdu, _) = parse_rtr_pdu(&bytes).unwrap();
        match pdu {
            RtrPdu::IPv4Prefix(p) => {
                assert!(p.is_withdrawal());
                assert_eq!(p.prefix, Ipv4Addr::new(10, 240, 0, 0));
            }
            _ => panic!("Expected IPv4Prefix"),
        }
    }

    #[test]
    fn test_masking_every_length() {
        let v4 = Ipv4Addr::new(0xde, 0xad, 0xbe, 0xef);
        for len in 0..=32u8 {
            let pdu = RtrIPv4Prefix {
                version: RtrProtocolVersion::V0,
                flags: RtrPrefixFlags::ANNOUNCEMENT,
                prefix_length: len,
                max_length: 32,
                prefix: v4,
                asn: Asn::new(1),
            };
            let (parsed, _) = parse_rtr_pdu(&pdu.encode()).unwrap();
            let expected = if len == 0 {
                0
            } else {
                u32::from(v4) & (u32::MAX << (32 - len as u32))
            };
            match parsed {
                RtrPdu::IPv4Prefix(p) => assert_eq!(u32::from(p.prefix), expected, "len {}", len),
                _ => panic!("Expected IPv4Prefix"),
            }
        }

        let v6 = Ipv6Addr::from(u128::MAX - 0x1234);
        for len in 0..=128u8 {
            let pdu = RtrIPv6Prefix {
                version: RtrProtocolVersion::V0,
                flags: RtrPrefixFlags::ANNOUNCEMENT,
                prefix_length: len,
                max_length: 128,
                prefix: v6,
                asn: Asn::new(1),
            };
            let (parsed, _) = parse_rtr_pdu(&pdu.encode()).unwrap();
            let expected = if len == 0 {
                0
            } else {
                u128::from(v6) & (u128::MAX << (128 - len as u32))
            };
            match parsed {
                RtrPdu::IPv6Prefix(p) => assert_eq!(u128::from(p.prefix), expected, "len {}", len),
                _ => panic!("Expected IPv6Prefix"),
            }
        }
    }

    #[test]
    fn test_ipv6_prefix_decode() {
        let prefix = RtrIPv6Prefix {
            version: RtrProtocolVersion::V1,
            flags: RtrPrefixFlags::ANNOUNCEMENT,
            prefix_length: 48,
            max_length: 64,
            prefix: Ipv6Addr::new(0x2001, 0xdb8, 0x1, 0, 0, 0, 0, 0),
            asn: Asn::new(65002),
        };
        let bytes = prefix.encode();
        assert_eq!(bytes.len(), 32);

        let (pdu, _) = parse_rtr_pdu(&bytes).unwrap();
        assert_eq!(pdu, RtrPdu::IPv6Prefix(prefix));
    }

    #[test]
    fn test_end_of_data_v0_decode() {
        let (pdu, consumed) = parse_rtr_pdu(&[0, 7, 0, 7, 0, 0, 0, 12, 0, 0, 0, 5]).unwrap();
        assert_eq!(consumed, 12);
        assert_eq!(pdu, RtrPdu::EndOfData(RtrEndOfData::new_v0(7, 5)));
    }

    #[test]
    fn test_end_of_data_v1_decode() {
        let eod = RtrEndOfData {
            version: RtrProtocolVersion::V1,
            session_id: 100,
            serial_number: 200,
            refresh_interval: Some(1800),
            retry_interval: Some(300),
            expire_interval: Some(3600),
        };
        let bytes = eod.encode();
        assert_eq!(bytes.len(), 24);

        let (pdu, _) = parse_rtr_pdu(&bytes).unwrap();
        match pdu {
            RtrPdu::EndOfData(e) => {
                assert_eq!(e.serial_number, 200);
                assert_eq!(e.timing().map(|t| t.retry), Some(300));
            }
            _ => panic!("Expected EndOfData"),
        }
    }

    #[test]
    fn test_end_of_data_v0_length_rejected_in_v1() {
        let err = parse_rtr_pdu(&[1, 7, 0, 7, 0, 0, 0, 12, 0, 0, 0, 5]).unwrap_err();
        assert!(matches!(
            err,
            RtrError::InvalidLength {
                expected: 24,
                actual: 12,
                pdu_type: 7
            }
        ));
    }

    #[test]
    fn test_serial_notify_decode() {
        let (pdu, _) = parse_rtr_pdu(&[0, 0, 0, 7, 0, 0, 0, 12, 0, 0, 0, 9]).unwrap();
        assert_eq!(
            pdu,
            RtrPdu::SerialNotify(RtrSerialNotify {
                version: RtrProtocolVersion::V0,
                session_id: 7,
                serial_number: 9,
            })
        );
    }

    #[test]
    fn test_incomplete_pdu() {
        let err = parse_rtr_pdu(&[0, 7, 0, 0, 0, 0, 0, 12, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            RtrError::IncompletePdu {
                available: 10,
                needed: 12
            }
        ));
    }

    #[test]
    fn test_unknown_pdu_type() {
        let err = parse_rtr_pdu(&[0, 99, 0, 0, 0, 0, 0, 8]).unwrap_err();
        assert!(matches!(err, RtrError::InvalidPduType(99)));

        // Cache Reset and Error Report are not modeled
        assert!(matches!(
            parse_rtr_pdu(&[0, 8, 0, 0, 0, 0, 0, 8]),
            Err(RtrError::InvalidPduType(8))
        ));
    }

    #[test]
    fn test_unknown_type_waits_for_full_pdu() {
        // the type is only judged once the whole advertised PDU is present
        let err = parse_rtr_pdu(&[0, 99, 0, 0, 0, 0, 0, 16, 0]).unwrap_err();
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_invalid_protocol_version() {
        let err = parse_rtr_pdu(&[2, 2, 0, 0, 0, 0, 0, 8]).unwrap_err();
        assert!(matches!(err, RtrError::InvalidProtocolVersion(2)));
    }

    #[test]
    fn test_invalid_length() {
        let err = parse_rtr_pdu(&[0, 2, 0, 0, 0, 0, 0, 10, 0, 0]).unwrap_err();
        assert!(matches!(err, RtrError::InvalidLength { .. }));
    }

    #[test]
    fn test_invalid_prefix_length() {
        // prefix_len > max_len
        let bytes = [0, 4, 0, 0, 0, 0, 0, 20, 1, 25, 24, 0, 192, 0, 2, 0, 0, 0, 0, 1];
        assert!(matches!(
            parse_rtr_pdu(&bytes),
            Err(RtrError::InvalidPrefixLength { .. })
        ));

        // max_len > 32
        let bytes = [0, 4, 0, 0, 0, 0, 0, 20, 1, 24, 33, 0, 192, 0, 2, 0, 0, 0, 0, 1];
        assert!(matches!(
            parse_rtr_pdu(&bytes),
            Err(RtrError::InvalidPrefixLength {
                max_allowed: 32,
                ..
            })
        ));
    }

    #[test]
    fn test_trailing_bytes_untouched() {
        let mut bytes = RtrResetQuery::default().encode().to_vec();
        bytes.extend_from_slice(&[0, 3]);
        let (_, consumed) = parse_rtr_pdu(&bytes).unwrap();
        assert_eq!(consumed, 8);
    }

    #[test]
    fn test_read_rtr_pdu_from_cursor() {
        use std::io::Cursor;

        let query = RtrSerialQuery::new(RtrProtocolVersion::V0, 1, 2);
        let mut cursor = Cursor::new(query.encode().to_vec());
        let pdu = read_rtr_pdu(&mut cursor, Some(65535)).unwrap();
        assert!(matches!(pdu, RtrPdu::SerialQuery(_)));

        let mut short = Cursor::new(vec![0u8, 7, 0, 0, 0, 0, 0, 12, 0]);
        assert!(matches!(
            read_rtr_pdu(&mut short, None),
            Err(RtrError::IoError(_))
        ));
    }

    #[test]
    fn test_read_rtr_pdu_rejects_huge_length() {
        use std::io::Cursor;

        // header claims 4 GiB; only the header may be consumed
        let mut cursor = Cursor::new(vec![0u8, 4, 0, 0, 0xff, 0xff, 0xff, 0xff, 1, 2, 3]);
        assert!(matches!(
            read_rtr_pdu(&mut cursor, Some(65535)),
            Err(RtrError::PduTooLarge {
                length: 0xffff_ffff,
                max: 65535
            })
        ));
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_error_display() {
        let err = RtrError::InvalidPduType(42);
        assert!(err.to_string().contains("42"));

        let err = RtrError::PduTooLarge {
            length: 100_000,
            max: 65535,
        };
        assert!(err.to_string().contains("65535"));
    }
}
