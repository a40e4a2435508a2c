//! In-memory transport connected to a scripted device.
//!
//! [`loopback`] returns both ends of a virtual serial cable. The host end
//! ([`LoopbackTransport`]) implements [`Transport`] and is handed to the
//! datalink; the device end ([`LoopbackDevice`]) stays with the test, which
//! plays the controller: it emits log/debug/reply lines and observes what
//! the host wrote.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::{LineBuffer, Transport, TransportError};

/// How long [`LoopbackTransport::read_lines`] waits for the first chunk.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// What the device pushes towards the host.
enum Incoming {
    Bytes(Vec<u8>),
    Fault(String),
}

/// Creates a connected transport/device pair with the default read timeout.
pub fn loopback() -> (LoopbackTransport, LoopbackDevice) {
    LoopbackTransport::pair(DEFAULT_READ_TIMEOUT)
}

/// Host side of a loopback pair.
pub struct LoopbackTransport {
    incoming: mpsc::UnboundedReceiver<Incoming>,
    written: mpsc::UnboundedSender<Vec<u8>>,
    connected: Arc<AtomicBool>,
    buffer: LineBuffer,
    read_timeout: Duration,
}

impl LoopbackTransport {
    /// Creates a connected pair whose reads wait at most `read_timeout`.
    pub fn pair(read_timeout: Duration) -> (Self, LoopbackDevice) {
        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        let (written_tx, written_rx) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(true));

        let transport = Self {
            incoming: incoming_rx,
            written: written_tx,
            connected: Arc::clone(&connected),
            buffer: LineBuffer::new(),
            read_timeout,
        };
        let device = LoopbackDevice {
            incoming: incoming_tx,
            written: written_rx,
            connected,
        };
        (transport, device)
    }

    fn accept(&mut self, incoming: Incoming) -> Result<(), TransportError> {
        match incoming {
            Incoming::Bytes(bytes) => {
                self.buffer.extend(&bytes);
                Ok(())
            }
            Incoming::Fault(reason) => {
                Err(TransportError::ReadFailed(std::io::Error::other(reason)))
            }
        }
    }

    fn ensure_connected(&self) -> Result<(), TransportError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(TransportError::ConnectionClosed("loopback device detached".into()))
        }
    }
}

impl Transport for LoopbackTransport {
    async fn read_lines(&mut self) -> Result<Vec<String>, TransportError> {
        self.ensure_connected()?;

        match tokio::time::timeout(self.read_timeout, self.incoming.recv()).await {
            Ok(Some(first)) => self.accept(first)?,
            Ok(None) => {
                // The device end was dropped.
                self.connected.store(false, Ordering::SeqCst);
                return Err(TransportError::ConnectionClosed(
                    "loopback device dropped".into(),
                ));
            }
            Err(_elapsed) => {}
        }
        while let Ok(next) = self.incoming.try_recv() {
            self.accept(next)?;
        }
        Ok(self.buffer.take_lines())
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        self.ensure_connected()?;
        self.written.send(line.to_vec()).map_err(|_| {
            self.connected.store(false, Ordering::SeqCst);
            TransportError::ConnectionClosed("loopback device dropped".into())
        })
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        self.ensure_connected()
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.connected.store(false, Ordering::SeqCst);
        self.buffer.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "loopback"
    }
}

/// Device side of a loopback pair.
pub struct LoopbackDevice {
    incoming: mpsc::UnboundedSender<Incoming>,
    written: mpsc::UnboundedReceiver<Vec<u8>>,
    connected: Arc<AtomicBool>,
}

impl LoopbackDevice {
    /// Emits one line; the newline terminator is appended.
    pub fn send_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.send_raw(&bytes);
    }

    /// Emits raw bytes exactly as given, e.g. half a line.
    pub fn send_raw(&self, bytes: &[u8]) {
        // The host end may already be gone; the device doesn't care.
        let _ = self.incoming.send(Incoming::Bytes(bytes.to_vec()));
    }

    /// Makes the host's next read fail with [`TransportError::ReadFailed`].
    pub fn fail_next_read(&self, reason: &str) {
        let _ = self.incoming.send(Incoming::Fault(reason.to_string()));
    }

    /// Simulates unplugging the device.
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Whether the host still sees the device as attached.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Drains every line written by the host so far, terminators included.
    pub fn written(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Ok(bytes) = self.written.try_recv() {
            lines.push(String::from_utf8_lossy(&bytes).into_owned());
        }
        lines
    }

    /// Waits up to `timeout` for the host's next written line.
    pub async fn next_written(&mut self, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.written.recv()).await {
            Ok(Some(bytes)) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_lines_returns_empty_when_idle() {
        let (mut transport, _device) = loopback();
        let lines = transport.read_lines().await.expect("read should succeed");
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_read_lines_joins_chunks() {
        let (mut transport, device) = loopback();
        device.send_raw(b"#hel");
        device.send_raw(b"lo\n!de");
        let lines = transport.read_lines().await.unwrap();
        assert_eq!(lines, vec!["#hello"]);

        device.send_raw(b"bug\n");
        let lines = transport.read_lines().await.unwrap();
        assert_eq!(lines, vec!["!debug"]);
    }

    #[tokio::test]
    async fn test_write_line_is_observed_by_device() {
        let (mut transport, mut device) = loopback();
        transport.write_line(b"FLU:waterNow:100\n").await.unwrap();
        transport.flush().await.unwrap();
        assert_eq!(device.written(), vec!["FLU:waterNow:100\n"]);
    }

    #[tokio::test]
    async fn test_fault_surfaces_once_then_reads_recover() {
        let (mut transport, device) = loopback();
        device.fail_next_read("spurious");
        device.send_line("#after");

        let err = transport.read_lines().await.unwrap_err();
        assert!(matches!(err, TransportError::ReadFailed(_)));
        assert!(!err.is_fatal());

        let lines = transport.read_lines().await.unwrap();
        assert_eq!(lines, vec!["#after"]);
    }

    #[tokio::test]
    async fn test_disconnect_is_fatal() {
        let (mut transport, device) = loopback();
        device.disconnect();
        assert!(!transport.is_connected());
        let err = transport.write_line(b"x\n").await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_dropping_device_closes_transport() {
        let (mut transport, device) = loopback();
        drop(device);
        let err = transport.read_lines().await.unwrap_err();
        assert!(err.is_fatal());
        assert!(!transport.is_connected());
    }
}
