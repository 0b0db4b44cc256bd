//! Unit tests for the logging functionality in the `loragw-hal` crate.

mod common;

use common::*;
use loragw_hal::logging::{
    init_logger, init_logger_with_level, log_packet_hex, log_rx_packet, log_tx_packet,
};

/// Tests that payload dumps handle empty and full-size buffers.
#[test]
fn test_payload_hex_dump() {
    init_logger_with_level(log::LevelFilter::Trace);
    log_packet_hex("empty", &[]);
    log_packet_hex("payload", &[0xDE, 0xAD, 0xBE, 0xEF]);
    log_packet_hex("full", &[0x55; 1024]);
}

/// Tests that initializing the logger twice is harmless.
#[test]
fn test_init_logger_twice() {
    init_logger();
    init_logger_with_level(log::LevelFilter::Trace);
    init_logger();
}

/// Tests that packet loggers accept every kind of record.
#[test]
fn test_packet_logging() {
    init_logger_with_level(log::LevelFilter::Trace);
    log_rx_packet(&rx_packet(3, 0x55));
    log_tx_packet(&lora_tx(0), 41_216);

    // a full gateway cycle logs at every level without panicking
    let (mut gw, mock) = running_gateway();
    mock.push_rx(rx_packet(0, 1));
    gw.receive(8).unwrap();
    gw.send(&lora_tx(0)).unwrap();
    gw.stop().unwrap();
}
