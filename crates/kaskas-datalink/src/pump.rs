//! The pump: the one task that talks to the device.
//!
//! Each iteration writes pending requests (unless a reply is still being
//! assembled, the link is half-duplex), reads whatever the device sent,
//! and routes every line to its sink. Transport errors never end the
//! loop; only the shutdown flag does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use kaskas_protocol::{LineRouter, Routed};
use kaskas_transport::{Transport, TransportError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::{DEVICE_TARGET, DatalinkConfig, LogSink, OutgoingDrain};

/// Produces a transport when the device is (re)discovered.
pub trait Opener<T>: Send + 'static {
    fn open(&mut self) -> Result<T, TransportError>;
}

impl<T, F> Opener<T> for F
where
    F: FnMut() -> Result<T, TransportError> + Send + 'static,
{
    fn open(&mut self) -> Result<T, TransportError> {
        self()
    }
}

/// State shared between the pump and the engine handle.
#[derive(Debug, Default)]
pub(crate) struct LinkState {
    pub(crate) started: AtomicBool,
    pub(crate) running: AtomicBool,
    pub(crate) connected: AtomicBool,
}

impl LinkState {
    fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

pub(crate) struct Pump<T: Transport> {
    pub(crate) config: DatalinkConfig,
    pub(crate) transport: Option<T>,
    pub(crate) opener: Option<Box<dyn Opener<T>>>,
    /// When the opener last ran; `None` if it never has.
    pub(crate) last_open_attempt: Option<Instant>,
    pub(crate) router: LineRouter,
    pub(crate) outgoing: OutgoingDrain,
    pub(crate) inbound: mpsc::Sender<String>,
    pub(crate) sink: LogSink,
    pub(crate) state: Arc<LinkState>,
    pub(crate) shutdown: watch::Receiver<bool>,
}

impl<T: Transport> Pump<T> {
    /// Runs until the shutdown flag is set.
    pub(crate) async fn run(mut self, ready: oneshot::Sender<()>) {
        self.state.running.store(true, Ordering::SeqCst);
        let _ = ready.send(());
        info!(transport = self.transport_name(), "datalink pump started");

        while !*self.shutdown.borrow() {
            if !self.ensure_transport() {
                self.idle(self.config.io_timeout).await;
                continue;
            }
            if let Err(error) = self.exchange().await {
                self.on_transport_error(error).await;
            }
        }

        if let Some(mut transport) = self.transport.take() {
            if let Err(error) = transport.close().await {
                debug!(%error, "closing transport on shutdown failed");
            }
        }
        self.state.set_connected(false);
        self.state.running.store(false, Ordering::SeqCst);
        info!("datalink pump stopped");
    }

    fn transport_name(&self) -> &str {
        self.transport.as_ref().map_or("none", Transport::name)
    }

    /// Sleeps for `duration`, waking early on shutdown.
    async fn idle(&mut self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.shutdown.changed() => {}
        }
    }

    /// Makes sure a transport is open, consulting the opener at most once
    /// per `reopen_interval`. Returns whether one is available.
    fn ensure_transport(&mut self) -> bool {
        if self.transport.is_some() {
            return true;
        }
        let Some(opener) = self.opener.as_mut() else {
            return false;
        };
        if self
            .last_open_attempt
            .is_some_and(|at| at.elapsed() < self.config.reopen_interval)
        {
            return false;
        }

        self.last_open_attempt = Some(Instant::now());
        match opener.open() {
            Ok(transport) => {
                info!(transport = transport.name(), "device connected");
                // Lines queued while disconnected were never answered.
                self.discard_outgoing("queued while disconnected");
                self.transport = Some(transport);
                self.state.set_connected(true);
                true
            }
            Err(error) => {
                debug!(%error, "device not available");
                false
            }
        }
    }

    /// One write/read round against the open transport.
    async fn exchange(&mut self) -> Result<(), TransportError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        // Half-duplex: nothing goes out while a reply is coming in.
        if !self.router.is_pending() {
            let lines = self.outgoing.drain();
            let total = lines.len();
            for (sent, line) in lines.into_iter().enumerate() {
                let written = match transport.write_line(&line).await {
                    Ok(()) => transport.flush().await,
                    Err(error) => Err(error),
                };
                if let Err(error) = written {
                    if total - sent > 1 {
                        warn!(dropped = total - sent - 1, "unsent requests dropped");
                    }
                    return Err(error);
                }
                trace!(line = %String::from_utf8_lossy(&line).trim_end(), "request written");
                tokio::time::sleep(self.config.write_pause).await;
            }
        }

        let lines = transport.read_lines().await?;
        let connected = transport.is_connected();
        for line in &lines {
            let line = line.trim();
            if !line.is_empty() {
                self.dispatch(line);
            }
        }

        if connected {
            Ok(())
        } else {
            Err(TransportError::NotConnected)
        }
    }

    /// Routes one trimmed, non-empty line.
    fn dispatch(&mut self, line: &str) {
        match self.router.route(line) {
            Routed::Log(text) => {
                info!(target: DEVICE_TARGET, "{text}");
                self.record(&text);
            }
            Routed::Debug(text) => {
                debug!(target: DEVICE_TARGET, "{text}");
                if tracing::enabled!(target: DEVICE_TARGET, tracing::Level::DEBUG) {
                    self.record(&text);
                }
            }
            Routed::Reply(reply) => match self.inbound.try_send(reply) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(reply)) => {
                    warn!(%reply, "no room for reply, dropping it");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            },
            Routed::Pending => trace!(line, "reply continues"),
            Routed::Overflow { discarded } => {
                warn!(discarded, "reply exceeded fragment limit, discarded");
            }
            Routed::Unrecognized(line) => {
                warn!(target: DEVICE_TARGET, %line, "unrecognized line");
            }
        }
    }

    fn record(&mut self, line: &str) {
        if let Err(error) = self.sink.append(line) {
            warn!(file = %self.sink.path().display(), %error, "device log write failed");
        }
    }

    /// Drops every queued line without writing it.
    fn discard_outgoing(&mut self, reason: &str) {
        let discarded = self.outgoing.drain().len();
        if discarded > 0 {
            warn!(discarded, reason, "unsent requests dropped");
        }
    }

    /// Logs `error`, and drops the transport if it is gone for good.
    ///
    /// A transient error backs off for one `io_timeout` before the next
    /// round.
    async fn on_transport_error(&mut self, error: TransportError) {
        let lost = error.is_fatal()
            || self
                .transport
                .as_ref()
                .is_none_or(|transport| !transport.is_connected());
        if !lost {
            warn!(%error, "transport error");
            self.idle(self.config.io_timeout).await;
            return;
        }

        warn!(%error, "device lost");
        self.state.set_connected(false);
        if let Some(mut transport) = self.transport.take() {
            let _ = transport.close().await;
        }
        self.router.reset();
        // Their callers give up before a new device could answer.
        self.discard_outgoing("device lost");
    }
}
