use crate::radio::{RxPacket, TxPacket};
use log::{debug, log_enabled, trace, Level};

/// Initializes the logger with the `env_logger` crate.
///
/// The level is taken from `RUST_LOG`. Calling it again after a logger is
/// installed has no effect.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Initializes the logger with a fixed default level, still overridable
/// through `RUST_LOG`.
pub fn init_logger_with_level(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

/// Logs a payload as hex at trace level.
pub fn log_packet_hex(label: &str, payload: &[u8]) {
    if log_enabled!(Level::Trace) {
        trace!("{label} [{} bytes]: {}", payload.len(), hex::encode_upper(payload));
    }
}

/// Logs the metadata of a received packet.
pub fn log_rx_packet(pkt: &RxPacket) {
    if log_enabled!(Level::Debug) {
        debug!(
            "RX if_chain={} {} {} {} crc={:?} count_us={} rssi={}dBm snr={:.2}dB size={}",
            pkt.if_chain,
            pkt.modulation,
            pkt.datarate,
            pkt.coderate.code(),
            pkt.status,
            pkt.count_us,
            pkt.rssi,
            pkt.snr_db(),
            pkt.size()
        );
    }
    log_packet_hex("RX payload", &pkt.payload);
}

/// Logs the metadata of a packet handed to the TX modem.
pub fn log_tx_packet(pkt: &TxPacket, airtime_us: u32) {
    if log_enabled!(Level::Debug) {
        debug!(
            "TX rf_chain={} {} Hz {} {} {} power={}dBm mode={} airtime={}us size={}",
            pkt.rf_chain,
            pkt.freq_hz,
            pkt.modulation,
            pkt.bandwidth,
            pkt.datarate,
            pkt.rf_power,
            pkt.tx_mode,
            airtime_us,
            pkt.size()
        );
    }
    log_packet_hex("TX payload", &pkt.payload);
}
