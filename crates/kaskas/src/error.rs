//! Unified error type for KasKas.

use kaskas_datalink::DatalinkError;
use kaskas_protocol::ProtocolError;
use kaskas_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Failures the device is expected to produce (no device, no answer, a
/// garbled answer) are not errors: they come back as a
/// [`Response`](kaskas_protocol::Response) with the matching status.
#[derive(Debug, thiserror::Error)]
pub enum KasKasError {
    /// A transport-level error (discovery, open, read, write).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (invalid request, unknown status).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A datalink-level error (lock, device log, stopped pump).
    #[error(transparent)]
    Datalink(#[from] DatalinkError),
}
