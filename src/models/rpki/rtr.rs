//! RPKI-to-Router (RTR) Protocol Data Structures
//!
//! PDU definitions for the subset of the RTR protocol a router-side client
//! exchanges with a validating cache:
//! - RTR v0: [RFC 6810](https://www.rfc-editor.org/rfc/rfc6810.txt)
//! - RTR v1: [RFC 8210](https://www.rfc-editor.org/rfc/rfc8210.txt)
//!
//! Only the seven PDU types used during ROA synchronization are modeled. Anything
//! else on the wire (Cache Reset, Router Key, Error Report, unassigned tags) is
//! rejected by the parser as an unknown type.
//!
//! # Example
//!
//! ```rust
//! use rpki_rtr_client::models::rpki::rtr::*;
//! use std::net::Ipv4Addr;
//!
//! let prefix = RtrIPv4Prefix {
//!     version: RtrProtocolVersion::V0,
//!     flags: RtrPrefixFlags::ANNOUNCEMENT,
//!     prefix_length: 24,
//!     max_length: 24,
//!     prefix: Ipv4Addr::new(192, 0, 2, 0),
//!     asn: 65001.into(),
//! };
//! assert!(prefix.is_announcement());
//! assert_eq!(prefix.network().to_string(), "192.0.2.0/24");
//! ```

use crate::models::Asn;
use bitflags::bitflags;
use ipnet::{Ipv4Net, Ipv6Net};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::net::{Ipv4Addr, Ipv6Addr};

// =============================================================================
// Core Enums
// =============================================================================

/// RTR Protocol Version
///
/// - V0 (RFC 6810): original protocol, End of Data carries only the serial
/// - V1 (RFC 8210): End of Data also carries refresh/retry/expire intervals
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, TryFromPrimitive, IntoPrimitive,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RtrProtocolVersion {
    /// RTR Protocol Version 0 (RFC 6810)
    #[default]
    V0 = 0,
    /// RTR Protocol Version 1 (RFC 8210)
    V1 = 1,
}

/// RTR PDU Type
///
/// Tags 5, 8, 9, 10 and anything unassigned have no variant here; the parser
/// reports them as [`InvalidPduType`](crate::parser::rpki::rtr::RtrError::InvalidPduType).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RtrPduType {
    /// Serial Notify - cache announces that new data is available
    SerialNotify = 0,
    /// Serial Query - client requests incremental update
    SerialQuery = 1,
    /// Reset Query - client requests full database
    ResetQuery = 2,
    /// Cache Response - cache begins sending data
    CacheResponse = 3,
    /// IPv4 Prefix - ROA for IPv4
    IPv4Prefix = 4,
    /// IPv6 Prefix - ROA for IPv6
    IPv6Prefix = 6,
    /// End of Data - cache finished sending data
    EndOfData = 7,
}

bitflags! {
    /// Flags octet of the IPv4/IPv6 Prefix PDUs.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct RtrPrefixFlags: u8 {
        /// Set for an announcement, clear for a withdrawal.
        const ANNOUNCEMENT = 0x01;
    }
}

// =============================================================================
// PDU Structs
// =============================================================================

/// Serial Notify PDU (Type 0)
///
/// Direction: Cache → Client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrSerialNotify {
    pub version: RtrProtocolVersion,
    pub session_id: u16,
    pub serial_number: u32,
}

/// Serial Query PDU (Type 1)
///
/// Sent by the client to request the changes since `serial_number` within the
/// session `session_id`.
///
/// Direction: Client → Cache
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrSerialQuery {
    pub version: RtrProtocolVersion,
    pub session_id: u16,
    pub serial_number: u32,
}

impl RtrSerialQuery {
    pub fn new(version: RtrProtocolVersion, session_id: u16, serial_number: u32) -> Self {
        Self {
            version,
            session_id,
            serial_number,
        }
    }
}

/// Reset Query PDU (Type 2)
///
/// Sent by the client to request the full database.
///
/// Direction: Client → Cache
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrResetQuery {
    pub version: RtrProtocolVersion,
}

impl RtrResetQuery {
    pub fn new(version: RtrProtocolVersion) -> Self {
        Self { version }
    }
}

/// Cache Response PDU (Type 3)
///
/// Opens a data transfer: followed by zero or more prefix PDUs and terminated
/// by an End of Data PDU.
///
/// Direction: Cache → Client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrCacheResponse {
    pub version: RtrProtocolVersion,
    pub session_id: u16,
}

/// IPv4 Prefix PDU (Type 4)
///
/// `prefix` is always stored truncated to `prefix_length` bits.
///
/// Direction: Cache → Client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrIPv4Prefix {
    pub version: RtrProtocolVersion,
    pub flags: RtrPrefixFlags,
    pub prefix_length: u8,
    pub max_length: u8,
    pub prefix: Ipv4Addr,
    pub asn: Asn,
}

impl RtrIPv4Prefix {
    #[inline]
    pub fn is_announcement(&self) -> bool {
        self.flags.contains(RtrPrefixFlags::ANNOUNCEMENT)
    }

    #[inline]
    pub fn is_withdrawal(&self) -> bool {
        !self.is_announcement()
    }

    /// The prefix as a network, host bits cleared.
    pub fn network(&self) -> Ipv4Net {
        Ipv4Net::new(self.prefix, self.prefix_length.min(32))
            .map(|net| net.trunc())
            .unwrap_or_else(|_| Ipv4Net::from(self.prefix))
    }
}

/// IPv6 Prefix PDU (Type 6)
///
/// Direction: Cache → Client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrIPv6Prefix {
    pub version: RtrProtocolVersion,
    pub flags: RtrPrefixFlags,
    pub prefix_length: u8,
    pub max_length: u8,
    pub prefix: Ipv6Addr,
    pub asn: Asn,
}

impl RtrIPv6Prefix {
    #[inline]
    pub fn is_announcement(&self) -> bool {
        self.flags.contains(RtrPrefixFlags::ANNOUNCEMENT)
    }

    #[inline]
    pub fn is_withdrawal(&self) -> bool {
        !self.is_announcement()
    }

    pub fn network(&self) -> Ipv6Net {
        Ipv6Net::new(self.prefix, self.prefix_length.min(128))
            .map(|net| net.trunc())
            .unwrap_or_else(|_| Ipv6Net::from(self.prefix))
    }
}

/// Timing parameters a v1 cache attaches to End of Data, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrTiming {
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
}

/// End of Data PDU (Type 7)
///
/// In v1 this PDU includes timing parameters. In v0 they are absent.
///
/// Direction: Cache → Client
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RtrEndOfData {
    pub version: RtrProtocolVersion,
    pub session_id: u16,
    pub serial_number: u32,
    pub refresh_interval: Option<u32>,
    pub retry_interval: Option<u32>,
    pub expire_interval: Option<u32>,
}

impl RtrEndOfData {
    /// Default refresh interval (1 hour) as recommended by RFC 8210
    pub const DEFAULT_REFRESH: u32 = 3600;
    /// Default retry interval (10 minutes) as recommended by RFC 8210
    pub const DEFAULT_RETRY: u32 = 600;
    /// Default expire interval (2 hours) as recommended by RFC 8210
    pub const DEFAULT_EXPIRE: u32 = 7200;

    pub fn new_v0(session_id: u16, serial_number: u32) -> Self {
        Self {
            version: RtrProtocolVersion::V0,
            session_id,
            serial_number,
            refresh_interval: None,
            retry_interval: None,
            expire_interval: None,
        }
    }

    /// The timing triple, present only when all three intervals were carried.
    pub fn timing(&self) -> Option<RtrTiming> {
        match (
            self.refresh_interval,
            self.retry_interval,
            self.expire_interval,
        ) {
            (Some(refresh), Some(retry), Some(expire)) => Some(RtrTiming {
                refresh,
                retry,
                expire,
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Unified PDU Enum
// =============================================================================

/// Any RTR PDU this crate understands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RtrPdu {
    SerialNotify(RtrSerialNotify),
    SerialQuery(RtrSerialQuery),
    ResetQuery(RtrResetQuery),
    CacheResponse(RtrCacheResponse),
    IPv4Prefix(RtrIPv4Prefix),
    IPv6Prefix(RtrIPv6Prefix),
    EndOfData(RtrEndOfData),
}

impl RtrPdu {
    pub fn pdu_type(&self) -> RtrPduType {
        match self {
            RtrPdu::SerialNotify(_) => RtrPduType::SerialNotify,
            RtrPdu::SerialQuery(_) => RtrPduType::SerialQuery,
            RtrPdu::ResetQuery(_) => RtrPduType::ResetQuery,
            RtrPdu::CacheResponse(_) => RtrPduType::CacheResponse,
            RtrPdu::IPv4Prefix(_) => RtrPduType::IPv4Prefix,
            RtrPdu::IPv6Prefix(_) => RtrPduType::IPv6Prefix,
            RtrPdu::EndOfData(_) => RtrPduType::EndOfData,
        }
    }

    pub fn version(&self) -> RtrProtocolVersion {
        match self {
            RtrPdu::SerialNotify(p) => p.version,
            RtrPdu::SerialQuery(p) => p.version,
            RtrPdu::ResetQuery(p) => p.version,
            RtrPdu::CacheResponse(p) => p.version,
            RtrPdu::IPv4Prefix(p) => p.version,
            RtrPdu::IPv6Prefix(p) => p.version,
            RtrPdu::EndOfData(p) => p.version,
        }
    }
}

macro_rules! impl_from_pdu {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for RtrPdu {
                fn from(pdu: $ty) -> Self {
                    RtrPdu::$variant(pdu)
                }
            }
        )*
    };
}

impl_from_pdu! {
    SerialNotify => RtrSerialNotify,
    SerialQuery => RtrSerialQuery,
    ResetQuery => RtrResetQuery,
    CacheResponse => RtrCacheResponse,
    IPv4Prefix => RtrIPv4Prefix,
    IPv6Prefix => RtrIPv6Prefix,
    EndOfData => RtrEndOfData,
}
