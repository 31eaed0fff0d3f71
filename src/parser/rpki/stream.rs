//! Reassembly of RTR PDUs from a TCP byte stream.
//!
//! A single `read` may return a fragment of a PDU, exactly one PDU, or several
//! PDUs back to back. [`RtrReassembler`] buffers whatever arrives and hands out
//! complete PDUs one at a time:
//!
//! ```rust
//! use rpki_rtr_client::parser::rpki::stream::RtrReassembler;
//! use rpki_rtr_client::models::rpki::rtr::RtrPdu;
//!
//! let mut reassembler = RtrReassembler::new();
//! reassembler.feed(&[0, 3, 0, 7]);
//! assert!(reassembler.next_pdu().unwrap().is_none());
//!
//! reassembler.feed(&[0, 0, 0, 8]);
//! let pdu = reassembler.next_pdu().unwrap().unwrap();
//! assert!(matches!(pdu, RtrPdu::CacheResponse(r) if r.session_id == 7));
//! assert!(reassembler.is_empty());
//! ```

use crate::models::rpki::rtr::RtrPdu;
use crate::parser::rpki::rtr::{parse_rtr_header, parse_rtr_pdu, RtrError};
use bytes::{Buf, BytesMut};
use log::trace;

/// Default ceiling on the advertised length of a single PDU.
///
/// The largest PDU this client decodes is 32 bytes; anything close to this limit
/// is either a type we don't model or a corrupted length field.
pub const DEFAULT_MAX_PDU_LEN: usize = 65535;

const INITIAL_CAPACITY: usize = 4096;

#[derive(Debug)]
pub struct RtrReassembler {
    buffer: BytesMut,
    max_pdu_len: Option<usize>,
}

impl Default for RtrReassembler {
    fn default() -> Self {
        Self::new()
    }
}

impl RtrReassembler {
    pub fn new() -> Self {
        RtrReassembler {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
            max_pdu_len: Some(DEFAULT_MAX_PDU_LEN),
        }
    }

    /// Set the maximum accepted PDU length. `None` removes the limit, which lets a
    /// peer make the buffer grow without bound.
    pub fn with_max_pdu_len(mut self, max_pdu_len: Option<usize>) -> Self {
        self.max_pdu_len = max_pdu_len;
        self
    }

    /// Append freshly received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Try to take one complete PDU off the front of the buffer.
    ///
    /// `Ok(None)` means more bytes are needed and leaves the buffer as it was.
    /// On success exactly the PDU's advertised length is consumed. On error
    /// nothing is consumed; the stream can't be resynchronized past a bad PDU,
    /// so callers drop the connection.
    ///
    /// Call this in a loop after every [`feed`](Self::feed) until it returns
    /// `Ok(None)`.
    pub fn next_pdu(&mut self) -> Result<Option<RtrPdu>, RtrError> {
        let header = match parse_rtr_header(&self.buffer) {
            Ok(header) => header,
            Err(e) if e.is_incomplete() => return Ok(None),
            Err(e) => return Err(e),
        };

        header.check_max_len(self.max_pdu_len)?;

        match parse_rtr_pdu(&self.buffer) {
            Ok((pdu, consumed)) => {
                self.buffer.advance(consumed);
                trace!(
                    "reassembled {:?} PDU ({} bytes, {} left buffered)",
                    pdu.pdu_type(),
                    consumed,
                    self.buffer.len()
                );
                Ok(Some(pdu))
            }
            Err(e) if e.is_incomplete() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Number of bytes received but not yet consumed.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Discard everything buffered, e.g. when the connection is replaced.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
