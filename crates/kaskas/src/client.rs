//! The request/response client and its builder.
//!
//! [`KasKas`] is the application's single handle on the controller. It
//! owns the datalink engine, turns calls into request lines, and matches
//! each one to its reply:
//!
//! ```text
//! Idle ──send──▶ AwaitingReply ──reply──▶ Matched
//!                      │
//!                      └──timeout──▶ TimedOut
//! ```
//!
//! One request is outstanding at a time. Concurrent callers queue up on
//! an async mutex, so the device never sees interleaved requests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use kaskas_datalink::{Datalink, DatalinkConfig, Opener};
use kaskas_protocol::{decode_reply, ProtocolError, Request, Response, Status};
use kaskas_transport::Transport;
#[cfg(feature = "serial")]
use kaskas_transport::SerialTransport;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::KasKasError;

/// Name the API is published under.
pub const CANONICAL_NAME: &str = "kaskas.api";

/// Argument of the response returned when no device is attached.
pub const NOT_CONNECTED: &str = "Not connected";

/// Handle on the controller.
///
/// Build one with [`KasKasBuilder`], share it behind an `Arc`, and call
/// [`start`](Self::start) before issuing requests.
pub struct KasKas<T: Transport> {
    link: Datalink<T>,
    /// Held for the whole exchange of one request.
    exchange: Mutex<()>,
}

impl<T: Transport> KasKas<T> {
    /// Name the API is published under.
    pub fn canonical_name() -> &'static str {
        CANONICAL_NAME
    }

    /// Starts the datalink pump.
    pub async fn start(&self) -> Result<(), KasKasError> {
        self.link.start().await?;
        Ok(())
    }

    /// Stops the datalink pump; with `blocking`, waits until it exited.
    pub async fn stop(&self, blocking: bool) -> Result<(), KasKasError> {
        self.link.stop(blocking).await?;
        Ok(())
    }

    /// Waits until the datalink pump exited.
    pub async fn wait(&self) -> Result<(), KasKasError> {
        self.link.wait().await?;
        Ok(())
    }

    /// Whether a device is currently attached.
    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Whether the datalink pump is currently looping.
    pub fn is_up_and_running(&self) -> bool {
        self.link.is_up_and_running()
    }

    /// Directory holding the device log and lock file.
    pub fn root(&self) -> &Path {
        self.link.config().root()
    }

    /// The underlying datalink.
    pub fn datalink(&self) -> &Datalink<T> {
        &self.link
    }

    /// Calls `function` on `module` with `args`.
    ///
    /// # Errors
    /// - [`ProtocolError::InvalidRequest`] if a component cannot be put on
    ///   the wire.
    /// - [`ProtocolError::UnknownStatus`] if the device answers with a
    ///   status this host does not know.
    ///
    /// Timeouts, garbled replies, and a missing device are reported through
    /// the response status instead.
    pub async fn request<I, S>(
        &self,
        module: &str,
        function: &str,
        args: I,
    ) -> Result<Response, KasKasError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let request = Request::call(module, function, args)?;
        self.send(request).await
    }

    /// Asks the device to describe every module and function it offers.
    ///
    /// The description comes back as the single argument of the response.
    pub async fn print_usage(&self) -> Result<Response, KasKasError> {
        self.send(Request::print_usage()).await
    }

    /// Sends `request` and waits for its reply.
    pub async fn send(&self, request: Request) -> Result<Response, KasKasError> {
        if !self.link.is_connected() {
            return Ok(Self::not_connected(&request));
        }

        let _exchange = self.exchange.lock().await;
        // The device may have gone while an earlier exchange held the lock.
        if !self.link.is_connected() {
            return Ok(Self::not_connected(&request));
        }

        let stale = self.link.discard_stale_replies().await;
        if stale > 0 {
            debug!(stale, "dropped replies to earlier requests");
        }

        self.link.enqueue(request.encode()).await?;
        debug!(%request, "request queued");

        let timeout = self.link.config().response_timeout;
        let Some(reply) = self.link.next_reply(timeout).await else {
            warn!(%request, ?timeout, "no reply");
            return Ok(Response::from_status(Status::Timeout));
        };

        match decode_reply(&request, &reply) {
            Ok(response) => {
                debug!(%request, %response, "reply received");
                Ok(response)
            }
            Err(ProtocolError::MismatchedReply { expected, reply }) => {
                warn!(%request, %expected, %reply, "reply does not match request");
                Ok(Response::from_status(Status::BadResponse))
            }
            Err(error) => Err(error.into()),
        }
    }
}

/// Builder for a [`KasKas`] handle.
///
/// # Example
///
/// ```rust,no_run
/// use kaskas::prelude::*;
///
/// # async fn run() -> Result<(), KasKasError> {
/// let kaskas = KasKasBuilder::new().root("/var/lib/kaskas").build_serial()?;
/// kaskas.start().await?;
/// let response = kaskas.request("FLU", "waterNow", ["100"]).await?;
/// println!("{response}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct KasKasBuilder {
    config: DatalinkConfig,
}

impl KasKasBuilder {
    /// Creates a builder with default settings, rooted in the current
    /// directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: DatalinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the directory for the device log and lock file.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Sets how long a request waits for its reply.
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout = timeout;
        self
    }

    /// Makes building fail when the device cannot be opened.
    pub fn require_device(mut self, required: bool) -> Self {
        self.config.require_device = required;
        self
    }

    /// Builds around an already open transport.
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> Result<KasKas<T>, KasKasError> {
        let link = Datalink::with_transport(self.config, transport)?;
        Ok(KasKas::from_datalink(link))
    }

    /// Builds with an opener that finds the device, now and after it was
    /// lost.
    pub fn build_with_opener<T, O>(self, opener: O) -> Result<KasKas<T>, KasKasError>
    where
        T: Transport,
        O: Opener<T>,
    {
        let link = Datalink::with_opener(self.config, opener)?;
        Ok(KasKas::from_datalink(link))
    }

    /// Builds for the first controller found on a `/dev/ttyACM*` port.
    #[cfg(feature = "serial")]
    pub fn build_serial(self) -> Result<KasKas<SerialTransport>, KasKasError> {
        let baud_rate = self.config.baud_rate;
        let timeout = self.config.io_timeout;
        self.build_with_opener(move || SerialTransport::open_next_available(baud_rate, timeout))
    }
}

impl<T: Transport> KasKas<T> {
    fn from_datalink(link: Datalink<T>) -> Self {
        Self {
            link,
            exchange: Mutex::new(()),
        }
    }

    fn not_connected(request: &Request) -> Response {
        warn!(%request, "device not connected");
        Response::new(Status::CommunicationError, vec![NOT_CONNECTED.to_string()])
    }
}
