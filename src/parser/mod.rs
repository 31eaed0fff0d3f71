//! Wire-format parsing: the RTR PDU codec and the stream reassembler built on it.

pub mod rpki;

pub use rpki::rtr::{parse_rtr_header, parse_rtr_pdu, read_rtr_pdu, RtrEncode, RtrError};
pub use rpki::stream::RtrReassembler;
