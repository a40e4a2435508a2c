//! Transport abstraction layer for KasKas.
//!
//! Provides the [`Transport`] trait that abstracts over the byte stream
//! connecting the host to the grow-bed controller. A transport deals in
//! whole text lines: it buffers partial input until the newline arrives
//! and hands complete lines to the datalink.
//!
//! # Feature Flags
//!
//! - `serial` (default): serial port transport via `serialport`
//!
//! [`LoopbackTransport`] is always available. It pairs a transport with an
//! in-memory [`LoopbackDevice`] and is what the test suites drive.

mod error;
mod lines;
mod loopback;
#[cfg(feature = "serial")]
mod serial;

pub use error::TransportError;
pub use lines::LineBuffer;
pub use loopback::{loopback, LoopbackDevice, LoopbackTransport};
#[cfg(feature = "serial")]
pub use serial::SerialTransport;

use std::future::Future;

/// A duplex, line-oriented connection to a device.
///
/// The methods return `Send` futures so a transport can be moved into a
/// spawned Tokio task that owns it exclusively.
pub trait Transport: Send + 'static {
    /// Returns every complete line currently available.
    ///
    /// Waits at most the transport's read timeout for the first data and
    /// never blocks beyond it. Returns an empty `Vec` when nothing arrived.
    /// Lines are returned without their line terminator.
    fn read_lines(
        &mut self,
    ) -> impl Future<Output = Result<Vec<String>, TransportError>> + Send;

    /// Writes one encoded line (terminator included) to the device.
    fn write_line(
        &mut self,
        line: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Flushes anything buffered by [`write_line`](Self::write_line).
    fn flush(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Closes the transport. Further reads and writes fail.
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Whether the device is still attached.
    fn is_connected(&self) -> bool;

    /// Human-readable name of the device (e.g. `/dev/ttyACM0`).
    fn name(&self) -> &str;
}
