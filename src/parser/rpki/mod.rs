//! RPKI (Resource Public Key Infrastructure) protocol parsers.
//!
//! - [`rtr`]: RPKI-to-Router (RTR) PDU parsing and encoding (RFC 6810, RFC 8210)
//! - [`stream`]: reassembly of PDUs from an arbitrarily fragmented byte stream
//!
//! # Example
//!
//! ```rust
//! use rpki_rtr_client::parser::rpki::rtr::{parse_rtr_pdu, RtrEncode};
//! use rpki_rtr_client::models::rpki::rtr::*;
//!
//! let query = RtrSerialQuery::new(RtrProtocolVersion::V0, 7, 5);
//! let (pdu, _) = parse_rtr_pdu(&query.encode()).unwrap();
//! assert!(matches!(pdu, RtrPdu::SerialQuery(_)));
//! ```

pub mod rtr;
pub mod stream;

pub use rtr::*;
pub use stream::*;
