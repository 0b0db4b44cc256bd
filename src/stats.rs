//! # Gateway Traffic Statistics
//!
//! Counters kept by a gateway since its last `start`. They can be exported as
//! JSON for a status endpoint or a periodic report.

use crate::radio::{CrcStatus, RxPacket};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayStats {
    /// Packets drained from the receive FIFO
    pub rx_packets: u64,
    /// Received packets with a valid CRC
    pub rx_crc_ok: u64,
    /// Received packets with a CRC error
    pub rx_crc_error: u64,
    /// Received packets without CRC
    pub rx_no_crc: u64,
    /// Failed FIFO reads, overflows included
    pub rx_read_errors: u64,
    /// FIFO overflows reported by the transport
    pub rx_overflows: u64,
    /// Packets lost to FIFO overflows
    pub rx_dropped: u64,
    /// Records discarded for breaking the transport contract
    pub rx_malformed: u64,
    /// Packets accepted by the TX modem
    pub tx_staged: u64,
    /// Sends refused by validation or by the hardware
    pub tx_rejected: u64,
}

impl GatewayStats {
    pub(crate) fn record_rx(&mut self, pkt: &RxPacket) {
        self.rx_packets += 1;
        match pkt.status {
            CrcStatus::Ok => self.rx_crc_ok += 1,
            CrcStatus::Error => self.rx_crc_error += 1,
            CrcStatus::Absent => self.rx_no_crc += 1,
        }
    }

    pub(crate) fn record_overflow(&mut self, dropped: u32) {
        self.rx_overflows += 1;
        self.rx_dropped += u64::from(dropped);
    }

    /// Share of received packets with a valid CRC, in percent
    pub fn crc_ok_rate(&self) -> f64 {
        if self.rx_packets == 0 {
            return 0.0;
        }
        self.rx_crc_ok as f64 * 100.0 / self.rx_packets as f64
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_counters() {
        let mut stats = GatewayStats::default();
        for status in [CrcStatus::Ok, CrcStatus::Ok, CrcStatus::Error, CrcStatus::Absent] {
            stats.record_rx(&RxPacket {
                status,
                ..Default::default()
            });
        }
        assert_eq!(stats.rx_packets, 4);
        assert_eq!(stats.rx_crc_ok, 2);
        assert_eq!(stats.rx_crc_error, 1);
        assert_eq!(stats.rx_no_crc, 1);
        assert!((stats.crc_ok_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_export() {
        let mut stats = GatewayStats::default();
        stats.record_overflow(3);
        let json = stats.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["rx_overflows"], 1);
        assert_eq!(value["rx_dropped"], 3);
    }
}
