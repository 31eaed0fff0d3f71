//! RPKI (Resource Public Key Infrastructure) related data structures.
//!
//! - [`rtr`]: RPKI-to-Router (RTR) Protocol PDU definitions (RFC 6810, RFC 8210)
//! - [`route`]: route-origin changes derived from prefix PDUs

pub mod route;
pub mod rtr;

pub use route::*;
pub use rtr::*;
