//! RTR session state machine.
//!
//! [`RtrSession`] owns the session id, the last serial and the synchronization
//! phase. It never touches a socket: the driver feeds it decoded PDUs and read
//! timeouts, and writes back whatever query it returns.
//!
//! ```text
//! Idle --start()--> AwaitingCacheResponse --Cache Response--> Synchronizing
//!                                                                  |
//!                   Synchronized <-------------End of Data---------+
//!                   |  ^
//!                   +--+ timeout: Serial Query / prefixes / End of Data
//! ```
//!
//! Any error returned from here means the connection must be dropped and the
//! session [`reset`](RtrSession::reset).

use crate::client::sink::RouteSink;
use crate::error::SessionError;
use crate::models::rpki::route::RouteChange;
use crate::models::rpki::rtr::*;
use log::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    /// No connection, or the connection was just dropped.
    #[default]
    Idle,
    /// Reset Query sent, waiting for the cache to open the transfer.
    AwaitingCacheResponse,
    /// Receiving the initial full data set.
    Synchronizing,
    /// Initial transfer complete; incremental updates from here on.
    Synchronized,
}

#[derive(Debug, Clone)]
pub struct RtrSession {
    version: RtrProtocolVersion,
    query_on_notify: bool,
    phase: SessionPhase,
    session_id: u16,
    last_serial: u32,
    timing: Option<RtrTiming>,
    changes_in_transfer: usize,
}

impl Default for RtrSession {
    fn default() -> Self {
        Self::new(RtrProtocolVersion::V0)
    }
}

impl RtrSession {
    pub fn new(version: RtrProtocolVersion) -> Self {
        RtrSession {
            version,
            query_on_notify: false,
            phase: SessionPhase::Idle,
            session_id: 0,
            last_serial: 0,
            timing: None,
            changes_in_transfer: 0,
        }
    }

    /// Answer a Serial Notify carrying a new serial with an immediate Serial Query.
    pub fn with_query_on_notify(mut self, enabled: bool) -> Self {
        self.query_on_notify = enabled;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Session id from the most recent Cache Response, 0 before the first one.
    pub fn session_id(&self) -> u16 {
        self.session_id
    }

    /// Serial from the most recent End of Data, 0 before the first one.
    pub fn last_serial(&self) -> u32 {
        self.last_serial
    }

    /// Timing parameters from the last v1 End of Data, if any.
    pub fn timing(&self) -> Option<RtrTiming> {
        self.timing
    }

    pub fn is_synchronized(&self) -> bool {
        self.phase == SessionPhase::Synchronized
    }

    /// Begin a fresh connection: returns the Reset Query to send.
    pub fn start(&mut self) -> RtrPdu {
        self.reset();
        self.phase = SessionPhase::AwaitingCacheResponse;
        info!("sending Reset Query (version {:?})", self.version);
        RtrPdu::ResetQuery(RtrResetQuery::new(self.version))
    }

    /// Drop back to `Idle`. Session id and serial are kept.
    pub fn reset(&mut self) {
        self.phase = SessionPhase::Idle;
        self.changes_in_transfer = 0;
    }

    /// Apply one PDU from the cache. Prefix PDUs are forwarded to `sink` as
    /// route changes. Returns a PDU to send back, if any.
    pub fn handle_pdu<S>(
        &mut self,
        pdu: &RtrPdu,
        sink: &mut S,
    ) -> Result<Option<RtrPdu>, SessionError>
    where
        S: RouteSink + ?Sized,
    {
        use SessionPhase::*;

        if pdu.version() != self.version {
            return Err(self.violation(SessionError::VersionMismatch {
                expected: self.version,
                received: pdu.version(),
            }));
        }

        match (self.phase, pdu) {
            (AwaitingCacheResponse, RtrPdu::CacheResponse(response)) => {
                info!(
                    "Cache Response received, session id {}",
                    response.session_id
                );
                self.session_id = response.session_id;
                self.changes_in_transfer = 0;
                self.phase = Synchronizing;
                Ok(None)
            }
            (Synchronized, RtrPdu::CacheResponse(response)) => {
                if response.session_id != self.session_id {
                    return Err(self.violation(SessionError::SessionIdMismatch {
                        expected: self.session_id,
                        received: response.session_id,
                    }));
                }
                debug!(
                    "Cache Response received for Serial Query, session id {}",
                    response.session_id
                );
                self.changes_in_transfer = 0;
                Ok(None)
            }
            (Synchronizing | Synchronized, RtrPdu::IPv4Prefix(prefix)) => {
                self.apply(&RouteChange::from(prefix), sink);
                Ok(None)
            }
            (Synchronizing | Synchronized, RtrPdu::IPv6Prefix(prefix)) => {
                self.apply(&RouteChange::from(prefix), sink);
                Ok(None)
            }
            (Synchronizing | Synchronized, RtrPdu::EndOfData(eod)) => {
                info!(
                    "End of Data received, serial {} ({} changes)",
                    eod.serial_number, self.changes_in_transfer
                );
                self.last_serial = eod.serial_number;
                if let Some(timing) = eod.timing() {
                    debug!(
                        "cache timing: refresh {}s, retry {}s, expire {}s",
                        timing.refresh, timing.retry, timing.expire
                    );
                    self.timing = Some(timing);
                }
                self.changes_in_transfer = 0;
                self.phase = Synchronized;
                Ok(None)
            }
            (Synchronized, RtrPdu::SerialNotify(notify)) => {
                info!(
                    "Serial Notify received, cache serial {} (ours {})",
                    notify.serial_number, self.last_serial
                );
                if self.query_on_notify && notify.serial_number != self.last_serial {
                    Ok(Some(self.serial_query()))
                } else {
                    Ok(None)
                }
            }
            (Synchronizing, RtrPdu::SerialNotify(notify)) => {
                // the transfer in progress already covers it
                debug!(
                    "ignoring Serial Notify (serial {}) during initial transfer",
                    notify.serial_number
                );
                Ok(None)
            }
            (phase, pdu) => Err(self.violation(SessionError::UnexpectedPdu {
                phase,
                pdu_type: pdu.pdu_type(),
            })),
        }
    }

    /// The read timeout expired without any bytes from the cache.
    ///
    /// When synchronized this yields exactly one Serial Query for the recorded
    /// session id and serial. Mid-transfer it means the cache stalled.
    pub fn handle_timeout(&mut self) -> Result<Option<RtrPdu>, SessionError> {
        match self.phase {
            SessionPhase::Synchronized => {
                info!(
                    "refresh interval elapsed, sending Serial Query (session id {}, serial {})",
                    self.session_id, self.last_serial
                );
                Ok(Some(self.serial_query()))
            }
            SessionPhase::Idle => Ok(None),
            phase => Err(self.violation(SessionError::Stalled(phase))),
        }
    }

    fn serial_query(&self) -> RtrPdu {
        RtrPdu::SerialQuery(RtrSerialQuery::new(
            self.version,
            self.session_id,
            self.last_serial,
        ))
    }

    fn apply<S>(&mut self, change: &RouteChange, sink: &mut S)
    where
        S: RouteSink + ?Sized,
    {
        debug!("{}", change);
        self.changes_in_transfer += 1;
        sink.on_route_change(change);
    }

    fn violation(&self, err: SessionError) -> SessionError {
        error!("{}", err);
        err
    }
}
