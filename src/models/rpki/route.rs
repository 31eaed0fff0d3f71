//! Route-origin changes produced by a synchronizing RTR session.

use crate::models::rpki::rtr::{RtrIPv4Prefix, RtrIPv6Prefix};
use crate::models::{Afi, Asn};
use ipnet::IpNet;
use std::fmt::{Display, Formatter};

/// Whether a validated ROA payload was added or removed by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RouteDirection {
    Announce,
    Withdraw,
}

impl RouteDirection {
    /// Single-character marker used in the route-change log line.
    pub const fn marker(self) -> char {
        match self {
            RouteDirection::Announce => '+',
            RouteDirection::Withdraw => '-',
        }
    }
}

/// One announce or withdraw of a (prefix, max length, origin AS) triple.
///
/// The `Display` impl renders the fixed-width line consumed by route-change
/// loggers:
///
/// ```rust
/// use rpki_rtr_client::models::{Asn, RouteChange, RouteDirection};
///
/// let change = RouteChange {
///     direction: RouteDirection::Announce,
///     prefix: "10.0.0.0/8".parse().unwrap(),
///     max_length: 24,
///     asn: Asn::new(64500),
/// };
/// assert_eq!(change.to_string(), "+ 10.0.0.0/8            8 -  24  as64500");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteChange {
    pub direction: RouteDirection,
    pub prefix: IpNet,
    pub max_length: u8,
    pub asn: Asn,
}

impl RouteChange {
    pub fn family(&self) -> Afi {
        Afi::from(&self.prefix)
    }

    pub fn prefix_length(&self) -> u8 {
        self.prefix.prefix_len()
    }

    pub fn is_announcement(&self) -> bool {
        self.direction == RouteDirection::Announce
    }
}

impl From<&RtrIPv4Prefix> for RouteChange {
    fn from(pdu: &RtrIPv4Prefix) -> Self {
        RouteChange {
            direction: if pdu.is_announcement() {
                RouteDirection::Announce
            } else {
                RouteDirection::Withdraw
            },
            prefix: IpNet::V4(pdu.network()),
            max_length: pdu.max_length,
            asn: pdu.asn,
        }
    }
}

impl From<&RtrIPv6Prefix> for RouteChange {
    fn from(pdu: &RtrIPv6Prefix) -> Self {
        RouteChange {
            direction: if pdu.is_announcement() {
                RouteDirection::Announce
            } else {
                RouteDirection::Withdraw
            },
            prefix: IpNet::V6(pdu.network()),
            max_length: pdu.max_length,
            asn: pdu.asn,
        }
    }
}

impl Display for RouteChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // the prefix column is 20 wide and truncated, long IPv6 prefixes lose their tail
        write!(
            f,
            "{} {:<20.20}{:>3} - {:>3}  as{}",
            self.direction.marker(),
            self.prefix.to_string(),
            self.prefix_length(),
            self.max_length,
            self.asn
        )
    }
}
