use std::fmt::{Display, Formatter};

/// ASN -- Autonomous System Number
///
/// RTR always carries origin AS numbers as 4 octets (RFC 6793), so unlike BGP
/// there is no 2-octet variant to track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Asn(u32);

impl Asn {
    pub const fn new(asn: u32) -> Self {
        Asn(asn)
    }

    #[inline]
    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl PartialEq<u32> for Asn {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl From<u32> for Asn {
    fn from(v: u32) -> Self {
        Asn(v)
    }
}

impl From<Asn> for u32 {
    fn from(value: Asn) -> Self {
        value.0
    }
}

impl Display for Asn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
