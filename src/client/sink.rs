//! Destinations for route-change events.
//!
//! The session hands every change to a [`RouteSink`]. Persistence is up to the
//! caller; the stock sinks cover the common cases:
//!
//! - closures `FnMut(&RouteChange)`
//! - `Vec<RouteChange>` to collect changes
//! - [`crossbeam_channel::Sender`] to hand changes to another thread
//! - [`LogSink`] to emit one `info` log line per change

use crate::models::rpki::route::RouteChange;
use crossbeam_channel::Sender;
use log::{info, warn};

pub trait RouteSink {
    fn on_route_change(&mut self, change: &RouteChange);
}

impl<F> RouteSink for F
where
    F: FnMut(&RouteChange),
{
    fn on_route_change(&mut self, change: &RouteChange) {
        self(change)
    }
}

impl RouteSink for Vec<RouteChange> {
    fn on_route_change(&mut self, change: &RouteChange) {
        self.push(*change);
    }
}

impl RouteSink for Sender<RouteChange> {
    fn on_route_change(&mut self, change: &RouteChange) {
        if self.send(*change).is_err() {
            warn!("route change receiver dropped, discarding {}", change);
        }
    }
}

/// Writes each change through the `log` facade at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl RouteSink for LogSink {
    fn on_route_change(&mut self, change: &RouteChange) {
        info!("{}", change);
    }
}
