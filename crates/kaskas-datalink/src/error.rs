//! Error types for the datalink layer.

use std::path::PathBuf;

use kaskas_transport::TransportError;

/// Errors that can occur while setting up or talking to the datalink.
#[derive(Debug, thiserror::Error)]
pub enum DatalinkError {
    /// Another engine already holds the lock on this root directory.
    #[error("another kaskas instance holds {}", path.display())]
    LockContention { path: PathBuf },

    /// The lock file could not be created or locked.
    #[error("cannot lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The device log file could not be opened.
    #[error("cannot open device log {}: {source}", path.display())]
    LogSink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening the device failed while the caller required it.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The pump has not been started yet.
    #[error("datalink not started")]
    NotStarted,

    /// The pump has exited; nothing is consuming the queue anymore.
    #[error("datalink stopped")]
    Stopped,
}
