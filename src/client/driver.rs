//! TCP transport driver.
//!
//! [`RtrClient::run`] owns one connection at a time: it connects, lets the
//! session send its Reset Query, then loops on a blocking read bounded by the
//! refresh interval. Received bytes go through an [`RtrReassembler`] into the
//! [`RtrSession`]; a read timeout becomes a Serial Query. Any failure closes the
//! socket and the client reconnects after a backoff delay, forever, until
//! [`StopHandle::stop`] is called.
//!
//! ```rust,no_run
//! use rpki_rtr_client::client::{LogSink, RtrClient, RtrClientConfig};
//! use std::thread;
//!
//! let mut client = RtrClient::new(RtrClientConfig::new("rtr.example.net"), LogSink);
//! let stop = client.stop_handle();
//! let worker = thread::spawn(move || client.run());
//!
//! // ... later, from any thread
//! stop.stop();
//! worker.join().unwrap().unwrap();
//! ```

use crate::client::backoff::Backoff;
use crate::client::config::RtrClientConfig;
use crate::client::session::RtrSession;
use crate::client::sink::RouteSink;
use crate::error::RtrClientError;
use crate::models::rpki::rtr::RtrPdu;
use crate::parser::rpki::rtr::RtrEncode;
use crate::parser::rpki::stream::RtrReassembler;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use log::{debug, error, info, warn};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const READ_BUFFER_SIZE: usize = 4096;

struct StopState {
    stopped: AtomicBool,
    /// Clone of the live socket, shut down by `stop()` to unblock the read.
    stream: Mutex<Option<TcpStream>>,
    wake_tx: Sender<()>,
    wake_rx: Receiver<()>,
}

/// Stops a running [`RtrClient`] from another thread.
///
/// Stopping is permanent: once stopped, `run` returns immediately.
#[derive(Clone)]
pub struct StopHandle {
    inner: Arc<StopState>,
}

impl StopHandle {
    fn new() -> Self {
        let (wake_tx, wake_rx) = crossbeam_channel::bounded(1);
        StopHandle {
            inner: Arc::new(StopState {
                stopped: AtomicBool::new(false),
                stream: Mutex::new(None),
                wake_tx,
                wake_rx,
            }),
        }
    }

    /// Close the active connection and make `run` return.
    ///
    /// A connection attempt already in progress is not interrupted: `run`
    /// returns once it completes or fails, which takes at most
    /// [`connect_timeout`](RtrClientConfig::connect_timeout).
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        if let Some(stream) = self.stream().take() {
            if let Err(e) = stream.shutdown(Shutdown::Both) {
                debug!("socket shutdown on stop: {}", e);
            }
        }
        // a full channel already holds a pending wake-up
        let _ = self.inner.wake_tx.try_send(());
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    fn register(&self, stream: TcpStream) {
        *self.stream() = Some(stream);
    }

    fn release(&self) {
        self.stream().take();
    }

    /// Sleep for `delay` unless stopped first. Returns whether the client was stopped.
    fn wait(&self, delay: Duration) -> bool {
        if let Err(RecvTimeoutError::Disconnected) = self.inner.wake_rx.recv_timeout(delay) {
            debug!("stop channel disconnected");
        }
        self.is_stopped()
    }

    fn stream(&self) -> MutexGuard<'_, Option<TcpStream>> {
        // the guarded value is a plain Option, a poisoned lock is still usable
        self.inner
            .stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// An RTR client bound to one cache, delivering route changes to `S`.
pub struct RtrClient<S: RouteSink> {
    config: RtrClientConfig,
    session: RtrSession,
    sink: S,
    stop: StopHandle,
    backoff: Backoff,
}

impl<S: RouteSink> RtrClient<S> {
    pub fn new(config: RtrClientConfig, sink: S) -> Self {
        let session = RtrSession::new(config.version).with_query_on_notify(config.query_on_notify);
        let backoff = Backoff::new(config.backoff);
        RtrClient {
            config,
            session,
            sink,
            stop: StopHandle::new(),
            backoff,
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Stop the client; equivalent to `stop_handle().stop()`.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn config(&self) -> &RtrClientConfig {
        &self.config
    }

    pub fn session(&self) -> &RtrSession {
        &self.session
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Keep the cache connection alive until stopped.
    ///
    /// Only an invalid configuration makes this return an error; connection and
    /// protocol failures are logged and followed by a reconnect.
    pub fn run(&mut self) -> Result<(), RtrClientError> {
        self.config.validate()?;
        let address = self.config.address();

        while !self.stop.is_stopped() {
            let result = match self.connect(&address) {
                Ok(stream) => self.serve(stream),
                Err(e) => Err(e),
            };
            self.stop.release();
            self.session.reset();

            if self.stop.is_stopped() {
                break;
            }
            match result {
                Ok(()) => {}
                Err(e @ RtrClientError::Codec(_)) => error!("{}: {}", address, e),
                Err(e) => warn!("{}: {}", address, e),
            }

            let delay = self.backoff.next_delay();
            info!("reconnecting to {} in {:?}", address, delay);
            if self.stop.wait(delay) {
                break;
            }
        }

        info!("RTR client for {} stopped", address);
        Ok(())
    }

    fn connect(&self, address: &str) -> Result<TcpStream, RtrClientError> {
        debug!("connecting to {}", address);
        let mut last_err = None;
        for addr in address.to_socket_addrs()? {
            if self.stop.is_stopped() {
                break;
            }
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!("connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err
            .unwrap_or_else(|| {
                io::Error::new(
                    ErrorKind::NotFound,
                    format!("{} resolved to no addresses", address),
                )
            })
            .into())
    }

    /// Run one connection to completion. `Ok` only when stopped.
    fn serve(&mut self, mut stream: TcpStream) -> Result<(), RtrClientError> {
        stream.set_read_timeout(Some(self.config.refresh_interval))?;
        stream.set_nodelay(true)?;
        self.stop.register(stream.try_clone()?);
        if self.stop.is_stopped() {
            return Ok(());
        }
        info!("connected to {}", self.config.address());

        let reset_query = self.session.start();
        send(&mut stream, &reset_query)?;

        let mut reassembler = RtrReassembler::new().with_max_pdu_len(self.config.max_pdu_len);
        let mut buf = [0u8; READ_BUFFER_SIZE];

        loop {
            match stream.read(&mut buf) {
                Ok(0) => {
                    if self.stop.is_stopped() {
                        return Ok(());
                    }
                    return Err(RtrClientError::Disconnected);
                }
                Ok(n) => {
                    reassembler.feed(&buf[..n]);
                    while let Some(pdu) = reassembler.next_pdu()? {
                        let was_synchronized = self.session.is_synchronized();
                        if let Some(reply) = self.session.handle_pdu(&pdu, &mut self.sink)? {
                            send(&mut stream, &reply)?;
                        }
                        if !was_synchronized && self.session.is_synchronized() {
                            self.backoff.reset();
                        }
                    }
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    if let Some(query) = self.session.handle_timeout()? {
                        send(&mut stream, &query)?;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    if self.stop.is_stopped() {
                        return Ok(());
                    }
                    return Err(e.into());
                }
            }

            if self.stop.is_stopped() {
                return Ok(());
            }
        }
    }
}

fn send(stream: &mut TcpStream, pdu: &RtrPdu) -> io::Result<()> {
    debug!("sending {:?}", pdu);
    stream.write_all(&pdu.encode())?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::config::BackoffConfig;
    use crate::models::rpki::route::RouteChange;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Instant;

    fn fast_backoff() -> BackoffConfig {
        BackoffConfig {
            initial: Duration::from_millis(10),
            max: Duration::from_millis(50),
            multiplier: 2,
        }
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let mut client = RtrClient::new(RtrClientConfig::new(""), Vec::<RouteChange>::new());
        assert!(matches!(
            client.run(),
            Err(RtrClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stop_before_run() {
        let mut client = RtrClient::new(
            RtrClientConfig::new("127.0.0.1"),
            Vec::<RouteChange>::new(),
        );
        client.stop();
        assert!(client.run().is_ok());
    }

    #[test]
    fn test_no_connect_attempt_once_stopped() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let client = RtrClient::new(
            RtrClientConfig::new("127.0.0.1"),
            Vec::<RouteChange>::new(),
        );
        client.stop();
        match client.connect(&address) {
            Err(RtrClientError::Io(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
            other => panic!("expected no connection, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_stop_interrupts_retry_loop() {
        // grab a free port, then close it so every connect is refused
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = RtrClientConfig::new("127.0.0.1")
            .with_port(port)
            .with_backoff(BackoffConfig {
                initial: Duration::from_secs(60),
                max: Duration::from_secs(60),
                multiplier: 2,
            });
        let mut client = RtrClient::new(config, Vec::<RouteChange>::new());
        let stop = client.stop_handle();

        let started = Instant::now();
        let worker = thread::spawn(move || client.run());
        thread::sleep(Duration::from_millis(100));
        stop.stop();

        assert!(worker.join().unwrap().is_ok());
        assert!(started.elapsed() < Duration::from_secs(30));
    }

    #[test]
    fn test_stop_unblocks_read() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let config = RtrClientConfig::new("127.0.0.1")
            .with_port(port)
            .with_backoff(fast_backoff());
        let mut client = RtrClient::new(config, Vec::<RouteChange>::new());
        let stop = client.stop_handle();
        let worker = thread::spawn(move || {
            let res = client.run();
            (res, client.session().phase())
        });

        let (mut cache, _) = listener.accept().unwrap();
        let mut query = [0u8; 8];
        cache.read_exact(&mut query).unwrap();
        assert_eq!(query, [0, 2, 0, 0, 0, 0, 0, 8]);

        // client is now blocked in read with a 30 minute timeout
        let started = Instant::now();
        stop.stop();
        let (res, phase) = worker.join().unwrap();
        assert!(res.is_ok());
        assert_eq!(phase, crate::client::session::SessionPhase::Idle);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
