//! Integration tests for draining the receive FIFO.

mod common;

use bytes::Bytes;
use common::*;
use loragw_hal::{CrcStatus, GatewayError, RxPacket, TransportError};

fn tags(packets: &[RxPacket]) -> Vec<u8> {
    packets.iter().map(|p| p.payload[0]).collect()
}

/// Tests that receive while idle fails instead of returning nothing.
#[test]
fn test_receive_when_idle() {
    let (mut gw, mock) = idle_gateway();
    mock.push_rx(rx_packet(0, 1));
    assert_eq!(gw.receive(8), Err(GatewayError::NotRunning));
    assert_eq!(mock.read_calls(), 0);
    assert_eq!(mock.fifo_len(), 1);
}

/// Tests that an empty FIFO is a normal, empty result.
#[test]
fn test_receive_empty() {
    let (mut gw, _mock) = running_gateway();
    assert!(gw.receive(8).unwrap().is_empty());
}

/// Tests that records come out in arrival order, a batch at a time.
#[test]
fn test_receive_preserves_order() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx_many([rx_packet(0, 0xA), rx_packet(1, 0xB), rx_packet(2, 0xC)]);

    assert_eq!(tags(&gw.receive(2).unwrap()), vec![0xA, 0xB]);
    assert_eq!(tags(&gw.receive(2).unwrap()), vec![0xC]);
    assert!(gw.receive(2).unwrap().is_empty());
}

/// Tests that receive(N) never returns more than N and advances by exactly
/// the count returned.
#[test]
fn test_receive_bounded() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx_many((0..6).map(|i| rx_packet(0, i)));

    let batch = gw.receive(4).unwrap();
    assert_eq!(batch.len(), 4);
    assert_eq!(mock.fifo_len(), 2);
}

/// Tests that the request is capped at the FIFO size.
#[test]
fn test_receive_capped_at_fifo_size() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx_many((0..12).map(|i| rx_packet(0, i)));

    assert_eq!(gw.receive(100).unwrap().len(), 8);
    assert_eq!(gw.receive(100).unwrap().len(), 4);
}

/// Tests that asking for zero packets does not touch the transport.
#[test]
fn test_receive_zero() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(0, 1));
    assert!(gw.receive(0).unwrap().is_empty());
    assert_eq!(mock.read_calls(), 0);
    assert_eq!(mock.fifo_len(), 1);
}

/// Tests that transport failures surface as HardwareReadError without
/// consuming packets.
#[test]
fn test_receive_transport_failure() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(0, 7));
    mock.fail_next_read(TransportError::Bus("USB disconnected".into()));

    assert_eq!(
        gw.receive(8),
        Err(GatewayError::HardwareReadError(TransportError::Bus(
            "USB disconnected".into()
        )))
    );
    assert!(gw.is_running());
    assert_eq!(tags(&gw.receive(8).unwrap()), vec![7]);
    assert_eq!(gw.stats().rx_read_errors, 1);
}

/// Tests that a FIFO overflow is reported distinctly.
#[test]
fn test_receive_overflow() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(0, 1));
    mock.signal_overflow(5);

    let err = gw.receive(8).unwrap_err();
    assert_eq!(
        err.transport_error(),
        Some(&TransportError::Overflow { dropped: 5 })
    );
    assert_eq!(gw.stats().rx_overflows, 1);
    assert_eq!(gw.stats().rx_dropped, 5);
    assert_eq!(gw.receive(8).unwrap().len(), 1);
}

/// Tests that a transport returning more records than requested is caught.
#[test]
fn test_receive_excess_records() {
    let (mut gw, mock) = running_gateway();
    mock.set_ignore_max(true);
    mock.push_rx_many((0..3).map(|i| rx_packet(0, i)));

    assert!(matches!(
        gw.receive(2),
        Err(GatewayError::HardwareReadError(TransportError::Malformed(_)))
    ));
    assert_eq!(mock.fifo_len(), 0);

    // nothing the transport handed over is lost
    assert_eq!(tags(&gw.receive(2).unwrap()), vec![0, 1]);
    assert_eq!(tags(&gw.receive(2).unwrap()), vec![2]);
    assert!(gw.receive(2).unwrap().is_empty());
}

/// Tests that valid packets around a malformed record are delivered by the
/// following calls, in order.
#[test]
fn test_receive_keeps_valid_packets_of_rejected_batch() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx_many([rx_packet(0, 1), rx_packet(10, 2), rx_packet(3, 3)]);

    assert!(matches!(
        gw.receive(8),
        Err(GatewayError::HardwareReadError(TransportError::Malformed(_)))
    ));
    assert_eq!(mock.fifo_len(), 0);
    assert_eq!(gw.stats().rx_malformed, 1);
    assert_eq!(gw.stats().rx_packets, 0);

    mock.push_rx(rx_packet(0, 4));
    assert_eq!(tags(&gw.receive(1).unwrap()), vec![1]);
    assert_eq!(tags(&gw.receive(8).unwrap()), vec![3]);
    assert_eq!(tags(&gw.receive(8).unwrap()), vec![4]);
    assert_eq!(gw.stats().rx_packets, 3);
}

/// Tests that held packets do not survive a restart.
#[test]
fn test_restart_discards_held_packets() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx_many([rx_packet(10, 1), rx_packet(0, 2)]);
    assert!(gw.receive(8).is_err());

    gw.stop().unwrap();
    gw.start().unwrap();
    assert!(gw.receive(8).unwrap().is_empty());
}

/// Tests that a record with an impossible IF chain or payload is caught.
#[test]
fn test_receive_malformed_records() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(10, 1));
    assert!(matches!(
        gw.receive(8),
        Err(GatewayError::HardwareReadError(TransportError::Malformed(_)))
    ));

    mock.push_rx(RxPacket {
        payload: Bytes::from(vec![0u8; 1025]),
        ..Default::default()
    });
    assert!(matches!(
        gw.receive(8),
        Err(GatewayError::HardwareReadError(TransportError::Malformed(_)))
    ));
}

/// Tests that payloads stay valid across later receive calls.
#[test]
fn test_payload_outlives_next_receive() {
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(0, 0x11));
    let first = gw.receive(1).unwrap();

    mock.push_rx(rx_packet(0, 0x22));
    let second = gw.receive(1).unwrap();

    assert_eq!(first[0].payload.as_ref(), &[0x11]);
    assert_eq!(second[0].payload.as_ref(), &[0x22]);
}

/// Tests the receive counters.
#[test]
fn test_receive_stats() {
    let (mut gw, mock) = running_gateway();
    let mut bad = rx_packet(8, 2);
    bad.status = CrcStatus::Error;
    let mut none = rx_packet(9, 3);
    none.status = CrcStatus::Absent;
    mock.push_rx_many([rx_packet(0, 1), bad, none]);

    gw.receive(8).unwrap();
    let stats = gw.stats();
    assert_eq!(stats.rx_packets, 3);
    assert_eq!(stats.rx_crc_ok, 1);
    assert_eq!(stats.rx_crc_error, 1);
    assert_eq!(stats.rx_no_crc, 1);
}
