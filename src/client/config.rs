//! Client configuration.
//!
//! ```rust
//! use rpki_rtr_client::client::RtrClientConfig;
//! use std::time::Duration;
//!
//! let config = RtrClientConfig::new("rtr.example.net")
//!     .with_port(8282)
//!     .with_refresh_interval(Duration::from_secs(600));
//! assert!(config.validate().is_ok());
//! ```

use crate::error::RtrClientError;
use crate::models::rpki::rtr::RtrProtocolVersion;
use crate::parser::rpki::stream::DEFAULT_MAX_PDU_LEN;
use std::time::Duration;

/// IANA-assigned port for RTR over plain TCP (RFC 6810 section 7).
pub const DEFAULT_RTR_PORT: u16 = 323;

/// How long the client waits for incoming bytes before sending a Serial Query.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(1800);

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Delay between reconnect attempts, doubling on every consecutive failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub max: Duration,
    pub multiplier: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(300),
            multiplier: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtrClientConfig {
    pub host: String,
    pub port: u16,
    /// Version stamped on outgoing queries.
    pub version: RtrProtocolVersion,
    /// Read timeout; when it expires in the synchronized state a Serial Query is sent.
    pub refresh_interval: Duration,
    /// Bound on a single connection attempt; also bounds how long `stop()` can
    /// wait for an attempt in flight.
    pub connect_timeout: Duration,
    pub backoff: BackoffConfig,
    /// Largest PDU accepted from the cache; `None` disables the check.
    pub max_pdu_len: Option<usize>,
    /// Send a Serial Query as soon as a Serial Notify announces a new serial,
    /// instead of waiting for the refresh interval.
    pub query_on_notify: bool,
}

impl RtrClientConfig {
    pub fn new(host: impl Into<String>) -> Self {
        RtrClientConfig {
            host: host.into(),
            port: DEFAULT_RTR_PORT,
            version: RtrProtocolVersion::V0,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            backoff: BackoffConfig::default(),
            max_pdu_len: Some(DEFAULT_MAX_PDU_LEN),
            query_on_notify: false,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_version(mut self, version: RtrProtocolVersion) -> Self {
        self.version = version;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_pdu_len(mut self, max_pdu_len: Option<usize>) -> Self {
        self.max_pdu_len = max_pdu_len;
        self
    }

    pub fn with_query_on_notify(mut self, enabled: bool) -> Self {
        self.query_on_notify = enabled;
        self
    }

    /// `host:port` as handed to the resolver.
    pub fn address(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            // bare IPv6 literal
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn validate(&self) -> Result<(), RtrClientError> {
        if self.host.trim().is_empty() {
            return Err(RtrClientError::InvalidConfig("host is empty".to_string()));
        }
        // std rejects a zero socket timeout
        if self.refresh_interval.is_zero() {
            return Err(RtrClientError::InvalidConfig(
                "refresh interval must be non-zero".to_string(),
            ));
        }
        if self.connect_timeout.is_zero() {
            return Err(RtrClientError::InvalidConfig(
                "connect timeout must be non-zero".to_string(),
            ));
        }
        if self.backoff.initial > self.backoff.max {
            return Err(RtrClientError::InvalidConfig(format!(
                "initial backoff {:?} exceeds maximum {:?}",
                self.backoff.initial, self.backoff.max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RtrClientConfig::new("roa.example.jp");
        assert_eq!(config.port, 323);
        assert_eq!(config.version, RtrProtocolVersion::V0);
        assert_eq!(config.refresh_interval, Duration::from_secs(1800));
        assert_eq!(config.max_pdu_len, Some(DEFAULT_MAX_PDU_LEN));
        assert!(!config.query_on_notify);
        assert_eq!(config.address(), "roa.example.jp:323");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ipv6_literal_address() {
        let config = RtrClientConfig::new("2001:db8::1").with_port(8282);
        assert_eq!(config.address(), "[2001:db8::1]:8282");
    }

    #[test]
    fn test_validate_rejects() {
        assert!(RtrClientConfig::new("").validate().is_err());
        assert!(RtrClientConfig::new("cache")
            .with_refresh_interval(Duration::ZERO)
            .validate()
            .is_err());
        assert!(RtrClientConfig::new("cache")
            .with_backoff(BackoffConfig {
                initial: Duration::from_secs(10),
                max: Duration::from_secs(1),
                multiplier: 2,
            })
            .validate()
            .is_err());
    }
}
