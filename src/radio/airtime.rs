//! Time-on-air estimation for outbound packets
//!
//! LoRa uses the symbol-count formula from the SX1301/SX127x datasheets:
//!
//! ```text
//! T_sym      = 2^SF / BW
//! T_preamble = (n_preamble + 4.25) * T_sym
//! n_payload  = 8 + max(ceil((8PL - 4SF + 28 + 16CRC - 20H) / (4(SF - 2DE))) * (CR + 4), 0)
//! ```
//!
//! with `DE` (low datarate optimize) set for SF11/SF12 at 125 kHz. FSK is
//! preamble, 3 sync bytes, a length byte, the payload and a 2 byte CRC at
//! the configured bitrate.

use crate::constants::{FSK_DEFAULT_DATARATE, FSK_DEFAULT_PREAMBLE, LORA_DEFAULT_PREAMBLE};
use crate::radio::modulation::DataRate;
use crate::radio::packet::TxPacket;

const FSK_SYNC_BYTES: u32 = 3;

/// Expected time on air of `pkt`, in microseconds
///
/// Fields left at their default are replaced by the values the TX path would
/// use, so the estimate is meaningful before and after resolution.
pub fn time_on_air_us(pkt: &TxPacket) -> u32 {
    if pkt.modulation.is_fsk() {
        fsk_time_on_air_us(pkt)
    } else {
        lora_time_on_air_us(pkt)
    }
}

fn lora_time_on_air_us(pkt: &TxPacket) -> u32 {
    let bw_hz = pkt.bandwidth.hz().unwrap_or(125_000);
    let sf = pkt.datarate.spreading_factor().unwrap_or(9);
    let cr = pkt.coderate.redundancy().unwrap_or(1);
    let preamble = if pkt.preamble == 0 {
        LORA_DEFAULT_PREAMBLE
    } else {
        pkt.preamble
    };

    let low_dr_optimize = sf >= 11 && bw_hz == 125_000;
    let t_sym_us = f64::from(1u32 << sf) * 1e6 / f64::from(bw_hz);

    let crc_bits: i64 = if pkt.no_crc { 0 } else { 16 };
    let header_bits: i64 = if pkt.no_header { 20 } else { 0 };
    let de: i64 = if low_dr_optimize { 2 } else { 0 };

    let numerator = 8 * pkt.size() as i64 - 4 * i64::from(sf) + 28 + crc_bits - header_bits;
    let denominator = 4 * (i64::from(sf) - de);
    let blocks = if numerator > 0 {
        (numerator + denominator - 1) / denominator
    } else {
        0
    };
    let payload_symbols = 8 + blocks * (i64::from(cr) + 4);

    let t_preamble_us = (f64::from(preamble) + 4.25) * t_sym_us;
    let t_payload_us = payload_symbols as f64 * t_sym_us;
    (t_preamble_us + t_payload_us).ceil() as u32
}

fn fsk_time_on_air_us(pkt: &TxPacket) -> u32 {
    let bps = match pkt.datarate {
        DataRate::Fsk(bps) if bps > 0 => bps,
        _ => FSK_DEFAULT_DATARATE,
    };
    let preamble = if pkt.preamble == 0 {
        FSK_DEFAULT_PREAMBLE
    } else {
        pkt.preamble
    };
    let crc_bytes = if pkt.no_crc { 0 } else { 2 };
    let bytes = u64::from(preamble) + u64::from(FSK_SYNC_BYTES) + 1 + pkt.size() as u64 + crc_bytes;

    // Round up to the next microsecond
    let bits = bytes * 8 * 1_000_000;
    bits.div_ceil(u64::from(bps)) as u32
}
