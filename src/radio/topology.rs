//! # Hardware Topology
//!
//! Describes what the concentrator physically offers: which demodulator sits
//! behind each IF chain, which frequencies each RF chain can tune to, and the
//! instantaneous bandwidth of the front-ends. A [`HardwareTopology`] is handed
//! to the gateway at construction and never changes afterwards, so several
//! gateways (or test doubles with unusual boards) can coexist.

use crate::constants::{
    IF_CHAIN_COUNT, RF_BANDWIDTH_HZ, RF_CHAIN_COUNT, RF_RX_LOW_FREQ_HZ, RF_RX_UP_FREQ_HZ,
    RF_TX_LOW_FREQ_HZ, RF_TX_UP_FREQ_HZ, SX125X_PLL_DENOM, TX_POWER_MAX_DBM, TX_POWER_MIN_DBM,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Demodulator fitted behind an IF chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum IfChainKind {
    /// Slot with no modem
    Undefined = 0x00,
    /// Placeholder slot, cannot be enabled
    Dummy = 0x01,
    /// Standard single-SF LoRa modem
    LoraStd = 0x10,
    /// LoRa receiver with multi-SF capability
    LoraMulti = 0x11,
    /// Standard FSK modem
    FskStd = 0x20,
}

impl IfChainKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether a chain of this kind can carry any configuration
    pub fn is_configurable(self) -> bool {
        !matches!(self, IfChainKind::Undefined | IfChainKind::Dummy)
    }
}

impl fmt::Display for IfChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IfChainKind::Undefined => "undefined",
            IfChainKind::Dummy => "dummy",
            IfChainKind::LoraStd => "LoRa std",
            IfChainKind::LoraMulti => "LoRa multi-SF",
            IfChainKind::FskStd => "FSK",
        };
        f.write_str(name)
    }
}

/// Inclusive frequency range in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreqBand {
    pub min_hz: u32,
    pub max_hz: u32,
}

impl FreqBand {
    pub const fn new(min_hz: u32, max_hz: u32) -> Self {
        Self { min_hz, max_hz }
    }

    pub fn contains(&self, freq_hz: u32) -> bool {
        (self.min_hz..=self.max_hz).contains(&freq_hz)
    }
}

impl fmt::Display for FreqBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] Hz", self.min_hz, self.max_hz)
    }
}

/// Fixed channelization and RF capabilities of one concentrator board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareTopology {
    /// Modem behind each IF chain, indexed by IF chain
    pub if_chain_kinds: [IfChainKind; IF_CHAIN_COUNT],
    /// Receive tuning range of each RF chain
    pub rf_rx_bands: [FreqBand; RF_CHAIN_COUNT],
    /// Transmit tuning range of each RF chain
    pub rf_tx_bands: [FreqBand; RF_CHAIN_COUNT],
    /// Instantaneous bandwidth of an RF front-end
    pub rf_bandwidth_hz: u32,
    /// Lowest TX power the gain table offers, in dBm
    pub tx_power_min_dbm: i8,
    /// Highest TX power the gain table offers, in dBm
    pub tx_power_max_dbm: i8,
}

impl HardwareTopology {
    /// The reference board: four multi-SF LoRa chains, four dummy slots, one
    /// single-SF LoRa chain and one FSK chain, two SX125x radios on 863-870 MHz.
    pub fn reference() -> Self {
        use IfChainKind::*;

        Self {
            if_chain_kinds: [
                LoraMulti, LoraMulti, LoraMulti, LoraMulti, Dummy, Dummy, Dummy, Dummy, LoraStd,
                FskStd,
            ],
            rf_rx_bands: [
                FreqBand::new(RF_RX_LOW_FREQ_HZ[0], RF_RX_UP_FREQ_HZ[0]),
                FreqBand::new(RF_RX_LOW_FREQ_HZ[1], RF_RX_UP_FREQ_HZ[1]),
            ],
            rf_tx_bands: [
                FreqBand::new(RF_TX_LOW_FREQ_HZ[0], RF_TX_UP_FREQ_HZ[0]),
                FreqBand::new(RF_TX_LOW_FREQ_HZ[1], RF_TX_UP_FREQ_HZ[1]),
            ],
            rf_bandwidth_hz: RF_BANDWIDTH_HZ,
            tx_power_min_dbm: TX_POWER_MIN_DBM,
            tx_power_max_dbm: TX_POWER_MAX_DBM,
        }
    }

    /// Kind of the given IF chain, `None` when out of range
    pub fn if_chain_kind(&self, if_chain: usize) -> Option<IfChainKind> {
        self.if_chain_kinds.get(if_chain).copied()
    }

    pub fn tx_power_in_range(&self, power_dbm: i8) -> bool {
        (self.tx_power_min_dbm..=self.tx_power_max_dbm).contains(&power_dbm)
    }
}

impl Default for HardwareTopology {
    fn default() -> Self {
        Self::reference()
    }
}

/// SX125x frequency register value for `freq_hz`
///
/// ```text
/// F_register(24bit) = F_rf (Hz) / F_step(Hz)
///                   = F_rf (Hz) * 2^19 / F_xtal(Hz)
///                   = F_rf (Hz) * 256 / 15625
/// ```
pub fn pll_register(freq_hz: u32) -> u32 {
    ((u64::from(freq_hz) << 8) / u64::from(SX125X_PLL_DENOM)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::XTAL_FREQ_HZ;

    #[test]
    fn test_reference_if_table() {
        let topo = HardwareTopology::reference();
        let codes: Vec<u8> = topo.if_chain_kinds.iter().map(|k| k.code()).collect();
        assert_eq!(
            codes,
            vec![0x11, 0x11, 0x11, 0x11, 0x01, 0x01, 0x01, 0x01, 0x10, 0x20]
        );
        assert_eq!(topo.if_chain_kind(10), None);
    }

    #[test]
    fn test_band_edges_inclusive() {
        let band = FreqBand::new(863_000_000, 870_000_000);
        assert!(band.contains(863_000_000));
        assert!(band.contains(870_000_000));
        assert!(!band.contains(862_999_999));
        assert!(!band.contains(870_000_001));
    }

    #[test]
    fn test_pll_register_matches_xtal_formula() {
        let freq = 868_100_000u32;
        let via_xtal = ((u64::from(freq) << 19) / u64::from(XTAL_FREQ_HZ)) as u32;
        assert_eq!(pll_register(freq), via_xtal);
    }

    #[test]
    fn test_dummy_slots_not_configurable() {
        assert!(!IfChainKind::Dummy.is_configurable());
        assert!(!IfChainKind::Undefined.is_configurable());
        assert!(IfChainKind::FskStd.is_configurable());
    }
}
