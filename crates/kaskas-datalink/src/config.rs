//! Datalink configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Name of the device log inside the root directory.
pub const LOG_FILE_NAME: &str = "kaskas.log";

/// Name of the lock file inside the root directory.
pub const LOCK_FILE_NAME: &str = "kaskas.lock";

/// Configuration for a [`Datalink`](crate::Datalink) and the client on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatalinkConfig {
    /// Directory holding the lock file and the device log.
    pub root: PathBuf,

    /// Upper bound on a single read from the transport.
    pub io_timeout: Duration,

    /// Pause after every written line. The controller's input buffer is
    /// small, so back-to-back writes overrun it.
    pub write_pause: Duration,

    /// How long a request waits for its reply.
    pub response_timeout: Duration,

    /// Minimum time between attempts to reopen a lost device.
    pub reopen_interval: Duration,

    /// Continuation lines a single reply may span before it is discarded.
    pub max_reply_fragments: usize,

    /// Encoded requests that may wait for the pump.
    pub outgoing_capacity: usize,

    /// Completed replies that may wait for a caller.
    pub inbound_capacity: usize,

    /// Serial baud rate used when opening the device.
    pub baud_rate: u32,

    /// Fail construction when the device cannot be opened, instead of
    /// starting disconnected.
    pub require_device: bool,
}

impl Default for DatalinkConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            io_timeout: Duration::from_millis(100),
            write_pause: Duration::from_millis(100),
            response_timeout: Duration::from_secs(5),
            reopen_interval: Duration::from_secs(1),
            max_reply_fragments: 64,
            outgoing_capacity: 64,
            inbound_capacity: 16,
            baud_rate: 115_200,
            require_device: false,
        }
    }
}

impl DatalinkConfig {
    /// Default configuration rooted at `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Fixes values the engine cannot work with.
    ///
    /// Capacities and the fragment limit are raised to at least 1, and a
    /// zero `io_timeout` is raised to 1 ms so an idle pump still yields.
    pub fn validated(mut self) -> Self {
        for (name, value) in [
            ("max_reply_fragments", &mut self.max_reply_fragments),
            ("outgoing_capacity", &mut self.outgoing_capacity),
            ("inbound_capacity", &mut self.inbound_capacity),
        ] {
            if *value == 0 {
                warn!(setting = name, "zero is not allowed, using 1");
                *value = 1;
            }
        }
        if self.io_timeout.is_zero() {
            warn!("io_timeout is zero, using 1ms");
            self.io_timeout = Duration::from_millis(1);
        }
        self
    }

    /// Path of the device log.
    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    /// Path of the lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE_NAME)
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
