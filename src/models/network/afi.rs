use ipnet::IpNet;
use std::fmt::{Display, Formatter};

/// AFI -- Address Family Identifier
///
/// RTR carries one prefix PDU type per family, so the family of a route change
/// is fully determined by the PDU it was decoded from.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Afi {
    Ipv4,
    Ipv6,
}

impl Afi {
    /// Number of bits in an address of this family.
    pub const fn max_prefix_len(self) -> u8 {
        match self {
            Afi::Ipv4 => 32,
            Afi::Ipv6 => 128,
        }
    }
}

impl From<&IpNet> for Afi {
    #[inline]
    fn from(value: &IpNet) -> Self {
        match value {
            IpNet::V4(_) => Afi::Ipv4,
            IpNet::V6(_) => Afi::Ipv6,
        }
    }
}

impl Display for Afi {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Afi::Ipv4 => write!(f, "v4"),
            Afi::Ipv6 => write!(f, "v6"),
        }
    }
}
