/*!
error module defines the error types used by the RTR session and client.

Codec failures live next to the codec as [`RtrError`]; this module wraps them
together with session and transport failures.
*/
use crate::client::session::SessionPhase;
use crate::models::rpki::rtr::{RtrPduType, RtrProtocolVersion};
use crate::parser::rpki::rtr::RtrError;
use std::io;
use thiserror::Error;

/// A PDU arrived that the session cannot accept in its current phase.
///
/// Every variant ends the current connection; the client reconnects and starts
/// over with a Reset Query.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The PDU type is not valid in this phase, e.g. a prefix before any Cache
    /// Response.
    #[error("unexpected {pdu_type:?} PDU while {phase:?}")]
    UnexpectedPdu {
        phase: SessionPhase,
        pdu_type: RtrPduType,
    },
    /// The cache answered with a different session id than the one recorded.
    #[error("session id mismatch: expected {expected}, received {received}")]
    SessionIdMismatch { expected: u16, received: u16 },
    /// The cache answered in a protocol version other than the one queried.
    #[error("protocol version mismatch: queried with {expected:?}, received {received:?}")]
    VersionMismatch {
        expected: RtrProtocolVersion,
        received: RtrProtocolVersion,
    },
    /// The read timeout expired before the cache finished a data transfer.
    #[error("cache stopped responding while {0:?}")]
    Stalled(SessionPhase),
}

#[derive(Debug, Error)]
pub enum RtrClientError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("PDU decode failed: {0}")]
    Codec(#[from] RtrError),
    #[error("protocol violation: {0}")]
    Session(#[from] SessionError),
    /// The cache closed the connection.
    #[error("connection closed by cache")]
    Disconnected,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
