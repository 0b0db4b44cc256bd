//! Packet records exchanged with the concentrator: what the receive path
//! drains out of the hardware FIFO and what the transmit path hands over.

use crate::radio::airtime::time_on_air_us;
use crate::radio::modulation::{Bandwidth, CodeRate, CrcStatus, DataRate, Modulation, TxMode};
use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One demodulated frame
///
/// The payload is an owned, reference-counted buffer. It stays valid for as
/// long as the caller keeps it, independently of later `receive` calls.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RxPacket {
    /// IF chain that received the packet
    pub if_chain: u8,
    /// CRC outcome
    pub status: CrcStatus,
    pub modulation: Modulation,
    pub datarate: DataRate,
    pub coderate: CodeRate,
    /// Internal concentrator counter at reception, 1 µs resolution, wrapping
    pub count_us: u32,
    /// Average packet RSSI in dBm
    pub rssi: i8,
    /// Average packet SNR in quarter dB (LoRa only)
    pub snr: i8,
    /// Minimum packet SNR in quarter dB (LoRa only)
    pub snr_min: i8,
    /// Maximum packet SNR in quarter dB (LoRa only)
    pub snr_max: i8,
    /// CRC carried in the payload
    pub crc: u16,
    pub payload: Bytes,
}

impl RxPacket {
    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Average SNR in dB
    pub fn snr_db(&self) -> f32 {
        f32::from(self.snr) / 4.0
    }
}

/// An outbound packet and the way its transmission is triggered
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TxPacket {
    /// Center frequency of the transmission
    pub freq_hz: u32,
    pub tx_mode: TxMode,
    /// Absolute counter value (`Timestamped`) or delay after the trigger
    /// (`GpsDelayed`, `EventDelayed`); ignored otherwise
    pub count_us: u32,
    /// RF chain to transmit through
    pub rf_chain: u8,
    /// TX power in dBm
    pub rf_power: i8,
    pub modulation: Modulation,
    /// Modulation bandwidth (LoRa only)
    pub bandwidth: Bandwidth,
    /// Frequency deviation in kHz (FSK only)
    pub f_dev: u16,
    pub datarate: DataRate,
    /// Error-correcting code (LoRa only)
    pub coderate: CodeRate,
    /// Preamble length, 0 for default
    pub preamble: u16,
    /// Do not send a CRC
    pub no_crc: bool,
    /// Implicit header mode (LoRa only)
    pub no_header: bool,
    pub payload: Bytes,
}

impl TxPacket {
    /// Payload size in bytes
    pub fn size(&self) -> usize {
        self.payload.len()
    }
}

/// When a staged job goes on air
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxTrigger {
    /// As soon as the modem can
    Immediate,
    /// When the microsecond counter reaches this value
    AtCounter(u32),
    /// After an external trigger event, plus a delay
    OnEvent { delay_us: u32 },
    /// After the next PPS edge following `reference`, plus a delay
    OnGps {
        reference: DateTime<Utc>,
        delay_us: u32,
    },
}

/// A validated transmission handed to the transport
///
/// `packet` has every "default" field resolved to a concrete value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxJob {
    pub packet: TxPacket,
    pub trigger: TxTrigger,
    /// Expected time on air
    pub airtime_us: u32,
}

impl TxJob {
    pub fn new(packet: TxPacket, trigger: TxTrigger) -> Self {
        let airtime_us = time_on_air_us(&packet);
        Self {
            packet,
            trigger,
            airtime_us,
        }
    }

    pub fn rf_chain(&self) -> u8 {
        self.packet.rf_chain
    }
}
