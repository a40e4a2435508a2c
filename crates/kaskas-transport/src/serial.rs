//! Serial port transport using `serialport`.
//!
//! The controller enumerates as a USB CDC-ACM device (`/dev/ttyACM*`).
//! `serialport` is a blocking API, so every port operation is shipped to
//! Tokio's blocking pool together with the port handle and handed back
//! when it completes. The async side never touches the port directly.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::SerialPort;

use crate::{LineBuffer, Transport, TransportError};

/// Device paths the controller shows up under.
const PORT_PREFIX: &str = "/dev/ttyACM";

/// Size of a single read from the driver.
const READ_CHUNK: usize = 1024;

/// A [`Transport`] over a serial port.
pub struct SerialTransport {
    name: String,
    /// `None` while an operation is in flight on the blocking pool, or
    /// after the device went away.
    port: Option<Box<dyn SerialPort>>,
    buffer: LineBuffer,
}

impl SerialTransport {
    /// Baud rate the controller firmware runs at.
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// Lists candidate controller ports that can currently be opened.
    pub fn find_ports() -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports()
            .map_err(|e| TransportError::EnumerationFailed(e.into()))?;

        let usable = ports
            .into_iter()
            .map(|p| p.port_name)
            .filter(|name| name.starts_with(PORT_PREFIX))
            .filter(|name| {
                // Probe: a port held by another process fails to open.
                match serialport::new(name, Self::DEFAULT_BAUD_RATE).open() {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::debug!(port = %name, error = %e, "skipping unusable port");
                        false
                    }
                }
            })
            .collect();
        Ok(usable)
    }

    /// Opens a specific port.
    ///
    /// `timeout` bounds every read, which in turn bounds how long
    /// [`read_lines`](Transport::read_lines) can take.
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        let port = serialport::new(path, baud_rate)
            .timeout(timeout)
            .open()
            .map_err(|e| TransportError::OpenFailed {
                port: path.to_string(),
                source: e.into(),
            })?;
        tracing::info!(port = path, baud_rate, "serial port opened");
        Ok(Self {
            name: path.to_string(),
            port: Some(port),
            buffer: LineBuffer::new(),
        })
    }

    /// Opens the first controller port that accepts the connection.
    pub fn open_next_available(baud_rate: u32, timeout: Duration) -> Result<Self, TransportError> {
        for path in Self::find_ports()? {
            match Self::open(&path, baud_rate, timeout) {
                Ok(transport) => return Ok(transport),
                Err(e) => tracing::debug!(port = %path, error = %e, "open failed, trying next"),
            }
        }
        Err(TransportError::NoPortsAvailable)
    }

    /// Runs `op` against the port on the blocking pool.
    ///
    /// The port is moved into the closure and restored afterwards. If the
    /// blocking task panics the port is lost and the transport reports
    /// itself disconnected.
    async fn with_port<R, F>(&mut self, op: F) -> Result<io::Result<R>, TransportError>
    where
        R: Send + 'static,
        F: FnOnce(&mut dyn SerialPort) -> io::Result<R> + Send + 'static,
    {
        let mut port = self.port.take().ok_or(TransportError::NotConnected)?;
        let (port, result) = tokio::task::spawn_blocking(move || {
            let result = op(port.as_mut());
            (port, result)
        })
        .await
        .map_err(|e| TransportError::ConnectionClosed(format!("serial worker failed: {e}")))?;
        self.port = Some(port);
        Ok(result)
    }

    /// Classifies an I/O error: a vanished device closes the transport,
    /// anything else is left for the caller to retry.
    fn on_io_error(&mut self, error: io::Error, wrap: fn(io::Error) -> TransportError) -> TransportError {
        match error.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof => {
                tracing::warn!(port = %self.name, error = %error, "serial device went away");
                self.port = None;
                TransportError::ConnectionClosed(error.to_string())
            }
            _ => wrap(error),
        }
    }
}

/// Reads whatever the driver has, waiting at most the port timeout for the
/// first byte.
fn read_available(port: &mut dyn SerialPort) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match port.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
            Err(e) => return Err(e),
        }
        if port.bytes_to_read().map_err(io::Error::from)? == 0 {
            break;
        }
    }
    Ok(out)
}

impl Transport for SerialTransport {
    async fn read_lines(&mut self) -> Result<Vec<String>, TransportError> {
        match self.with_port(read_available).await? {
            Ok(bytes) => {
                self.buffer.extend(&bytes);
                Ok(self.buffer.take_lines())
            }
            Err(e) => Err(self.on_io_error(e, TransportError::ReadFailed)),
        }
    }

    async fn write_line(&mut self, line: &[u8]) -> Result<(), TransportError> {
        let line = line.to_vec();
        match self.with_port(move |port| port.write_all(&line)).await? {
            Ok(()) => Ok(()),
            Err(e) => Err(self.on_io_error(e, TransportError::WriteFailed)),
        }
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        match self.with_port(|port| port.flush()).await? {
            Ok(()) => Ok(()),
            Err(e) => Err(self.on_io_error(e, TransportError::WriteFailed)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            tracing::info!(port = %self.name, "serial port closed");
        }
        self.buffer.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
