//! Integration tests for the transports, driven through the [`Transport`]
//! trait the way the datalink uses them.

use std::time::Duration;

use kaskas_transport::{loopback, LoopbackTransport, Transport, TransportError};

/// Reads until at least `want` lines arrived or `attempts` reads passed.
async fn read_at_least<T: Transport>(
    transport: &mut T,
    want: usize,
    attempts: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    for _ in 0..attempts {
        lines.extend(transport.read_lines().await.expect("read should succeed"));
        if lines.len() >= want {
            break;
        }
    }
    lines
}

#[tokio::test]
async fn test_loopback_round_trip_through_trait() {
    let (mut transport, mut device) = loopback();

    transport.write_line(b"MTC:getMetrics\n").await.unwrap();
    transport.flush().await.unwrap();
    assert_eq!(
        device.next_written(Duration::from_millis(100)).await.as_deref(),
        Some("MTC:getMetrics\n")
    );

    device.send_line("@MTC<OK:21.5|55.2|19.8|>");
    device.send_line("#pump on");
    let lines = read_at_least(&mut transport, 2, 10).await;
    assert_eq!(lines, vec!["@MTC<OK:21.5|55.2|19.8|>", "#pump on"]);
}

#[tokio::test]
async fn test_loopback_reassembles_byte_sized_chunks() {
    let (mut transport, device) = LoopbackTransport::pair(Duration::from_millis(5));
    for byte in b"@FLU<OK:DONE>\n" {
        device.send_raw(&[*byte]);
    }
    let lines = read_at_least(&mut transport, 1, 10).await;
    assert_eq!(lines, vec!["@FLU<OK:DONE>"]);
}

#[tokio::test]
async fn test_loopback_close_rejects_further_io() {
    let (mut transport, _device) = loopback();
    transport.close().await.unwrap();
    assert!(!transport.is_connected());
    let err = transport.read_lines().await.unwrap_err();
    assert!(matches!(err, TransportError::ConnectionClosed(_)));
}

#[tokio::test]
async fn test_loopback_name() {
    let (transport, _device) = loopback();
    assert_eq!(transport.name(), "loopback");
}

#[cfg(feature = "serial")]
mod serial {
    use std::time::Duration;

    use kaskas_transport::{SerialTransport, TransportError};

    #[test]
    fn test_open_missing_port_fails_with_path() {
        let result = SerialTransport::open(
            "/dev/ttyACM-does-not-exist",
            SerialTransport::DEFAULT_BAUD_RATE,
            Duration::from_millis(100),
        );
        match result {
            Err(TransportError::OpenFailed { port, .. }) => {
                assert_eq!(port, "/dev/ttyACM-does-not-exist");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing port should fail"),
        }
    }
}
