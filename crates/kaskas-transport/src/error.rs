/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No device is attached to this transport.
    #[error("transport not connected")]
    NotConnected,

    /// The device went away (unplugged, closed by the peer).
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Listing candidate devices failed.
    #[error("port enumeration failed: {0}")]
    EnumerationFailed(#[source] std::io::Error),

    /// No candidate device could be found.
    #[error("no serial ports available")]
    NoPortsAvailable,

    /// Opening a specific device failed.
    #[error("failed to open {port}: {source}")]
    OpenFailed {
        /// Device path that was tried.
        port: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Writing data failed.
    #[error("write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Reading data failed.
    #[error("read failed: {0}")]
    ReadFailed(#[source] std::io::Error),
}

impl TransportError {
    /// Returns `true` if the transport cannot be used any more and has to
    /// be reopened.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotConnected | Self::ConnectionClosed(_))
    }
}
