//! RTR client: configuration, session state machine, sinks and the TCP driver.

pub mod backoff;
pub mod config;
pub mod driver;
pub mod session;
pub mod sink;

pub use backoff::Backoff;
pub use config::{
    BackoffConfig, RtrClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REFRESH_INTERVAL,
    DEFAULT_RTR_PORT,
};
pub use driver::{RtrClient, StopHandle};
pub use session::{RtrSession, SessionPhase};
pub use sink::{LogSink, RouteSink};
