//! Data structures shared by the codec and the client.

pub mod network;
pub mod rpki;

pub use network::*;
pub use rpki::*;
