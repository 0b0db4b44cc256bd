//! Channel Configuration Store
//!
//! Holds the desired configuration of every RF chain (radio front-end) and IF
//! chain (demodulator), validates each slot against the board topology as it
//! is written, and turns the whole store into a [`ChannelPlan`] when the
//! gateway starts.
//!
//! Per-slot rules are checked on write; rules that depend on several slots
//! (an IF chain's RF chain being enabled, the IF offset fitting inside the RF
//! passband) are checked by [`ChannelStore::build_plan`].

use crate::constants::{
    FSK_DATARATE_MAX, FSK_DATARATE_MIN, FSK_DEFAULT_DATARATE, IF_CHAIN_COUNT, RF_CHAIN_COUNT,
};
use crate::error::{GatewayError, Result};
use crate::radio::{Bandwidth, DataRate, HardwareTopology, IfChainKind};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration of one RF chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RfChainConfig {
    pub enable: bool,
    /// Center frequency in Hz
    pub freq_hz: u32,
}

impl RfChainConfig {
    pub fn enabled(freq_hz: u32) -> Self {
        Self {
            enable: true,
            freq_hz,
        }
    }
}

/// Configuration of one IF chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IfChainConfig {
    pub enable: bool,
    /// RF chain feeding this demodulator
    pub rf_chain: u8,
    /// Center frequency offset from the RF chain, in Hz
    pub freq_hz: i32,
    pub bandwidth: Bandwidth,
    pub datarate: DataRate,
}

impl IfChainConfig {
    /// Enabled chain with hardware-default bandwidth and datarate
    pub fn enabled(rf_chain: u8, freq_hz: i32) -> Self {
        Self {
            enable: true,
            rf_chain,
            freq_hz,
            ..Default::default()
        }
    }

    pub fn with_bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.bandwidth = bandwidth;
        self
    }

    pub fn with_datarate(mut self, datarate: DataRate) -> Self {
        self.datarate = datarate;
        self
    }
}

/// IF chain as programmed: its modem kind and its configuration with every
/// default resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedIfChain {
    pub kind: IfChainKind,
    pub config: IfChainConfig,
}

/// Validated snapshot of the store handed to the transport by `start`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlan {
    pub rf_chains: [RfChainConfig; RF_CHAIN_COUNT],
    pub if_chains: [ResolvedIfChain; IF_CHAIN_COUNT],
}

impl ChannelPlan {
    pub fn rf_enabled(&self, rf_chain: usize) -> bool {
        self.rf_chains.get(rf_chain).is_some_and(|rf| rf.enable)
    }

    /// Enabled IF chains with their index
    pub fn enabled_if_chains(&self) -> impl Iterator<Item = (usize, &ResolvedIfChain)> {
        self.if_chains
            .iter()
            .enumerate()
            .filter(|(_, chain)| chain.config.enable)
    }
}

/// Desired configuration of every chain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelStore {
    rf_chains: [RfChainConfig; RF_CHAIN_COUNT],
    if_chains: [IfChainConfig; IF_CHAIN_COUNT],
}

impl ChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration of RF chain `index`
    ///
    /// # Returns
    /// * `InvalidIndex` when `index` is not an RF chain
    /// * `InvalidConfig` when the chain is enabled outside its RX band
    pub fn set_rf(
        &mut self,
        topology: &HardwareTopology,
        index: u8,
        config: RfChainConfig,
    ) -> Result<()> {
        let i = check_index(index, RF_CHAIN_COUNT)?;
        if config.enable {
            let band = &topology.rf_rx_bands[i];
            if !band.contains(config.freq_hz) {
                return Err(invalid(format!(
                    "RF chain {i} frequency {} Hz outside RX band {band}",
                    config.freq_hz
                )));
            }
        }
        self.rf_chains[i] = config;
        Ok(())
    }

    /// Replace the configuration of IF chain `index`
    ///
    /// Disabled chains are stored as given. Enabled chains must sit on a
    /// configurable modem, reference an existing RF chain and use a bandwidth
    /// and datarate that modem supports.
    pub fn set_if(
        &mut self,
        topology: &HardwareTopology,
        index: u8,
        config: IfChainConfig,
    ) -> Result<()> {
        let i = check_index(index, IF_CHAIN_COUNT)?;
        if config.enable {
            let kind = topology
                .if_chain_kind(i)
                .unwrap_or(IfChainKind::Undefined);
            if usize::from(config.rf_chain) >= RF_CHAIN_COUNT {
                return Err(invalid(format!(
                    "IF chain {i} references RF chain {} (only {RF_CHAIN_COUNT} exist)",
                    config.rf_chain
                )));
            }
            resolve_if_chain(i, kind, &config)?;
        }
        self.if_chains[i] = config;
        Ok(())
    }

    pub fn rf_chain(&self, index: u8) -> Result<RfChainConfig> {
        let i = check_index(index, RF_CHAIN_COUNT)?;
        Ok(self.rf_chains[i])
    }

    pub fn if_chain(&self, index: u8) -> Result<IfChainConfig> {
        let i = check_index(index, IF_CHAIN_COUNT)?;
        Ok(self.if_chains[i])
    }

    /// Validate the store as a whole and resolve every default
    pub fn build_plan(&self, topology: &HardwareTopology) -> Result<ChannelPlan> {
        if !self.rf_chains.iter().any(|rf| rf.enable) {
            return Err(invalid("no RF chain enabled".to_string()));
        }

        let half_rf_bw = i64::from(topology.rf_bandwidth_hz / 2);
        let mut if_chains = [ResolvedIfChain {
            kind: IfChainKind::Undefined,
            config: IfChainConfig::default(),
        }; IF_CHAIN_COUNT];

        for (i, (slot, config)) in if_chains.iter_mut().zip(self.if_chains.iter()).enumerate() {
            let kind = topology
                .if_chain_kind(i)
                .unwrap_or(IfChainKind::Undefined);
            slot.kind = kind;

            if !config.enable {
                slot.config = *config;
                continue;
            }

            let rf = usize::from(config.rf_chain);
            if !self.rf_chains.get(rf).is_some_and(|c| c.enable) {
                return Err(invalid(format!(
                    "IF chain {i} references disabled RF chain {rf}"
                )));
            }

            let resolved = resolve_if_chain(i, kind, config)?;
            let half_bw = i64::from(resolved.bandwidth.hz().unwrap_or(0) / 2);
            let offset = i64::from(resolved.freq_hz).abs();
            if offset + half_bw > half_rf_bw {
                return Err(invalid(format!(
                    "IF chain {i} offset {} Hz with {} bandwidth exceeds the {} Hz RF passband",
                    resolved.freq_hz, resolved.bandwidth, topology.rf_bandwidth_hz
                )));
            }
            slot.config = resolved;
        }

        Ok(ChannelPlan {
            rf_chains: self.rf_chains,
            if_chains,
        })
    }
}

fn check_index(index: u8, count: usize) -> Result<usize> {
    let i = usize::from(index);
    if i >= count {
        debug!("Rejected chain index {i}, {count} chains available");
        return Err(GatewayError::InvalidIndex { index: i, count });
    }
    Ok(i)
}

fn invalid(reason: String) -> GatewayError {
    debug!("Rejected configuration: {reason}");
    GatewayError::InvalidConfig(reason)
}

/// Apply the modem rules of `kind` to an enabled IF chain, filling in the
/// hardware defaults for bandwidth and datarate.
fn resolve_if_chain(
    index: usize,
    kind: IfChainKind,
    config: &IfChainConfig,
) -> Result<IfChainConfig> {
    if !kind.is_configurable() {
        return Err(invalid(format!(
            "IF chain {index} is a {kind} slot and cannot be enabled"
        )));
    }

    let mut resolved = *config;
    match kind {
        IfChainKind::Undefined | IfChainKind::Dummy => {}
        IfChainKind::LoraStd => {
            if resolved.bandwidth == Bandwidth::Default {
                resolved.bandwidth = Bandwidth::Khz250;
            }
            match resolved.datarate {
                DataRate::Default => resolved.datarate = DataRate::Sf9,
                dr if dr.is_single_sf() => {}
                dr => {
                    return Err(invalid(format!(
                        "IF chain {index} ({kind}) needs a single spreading factor, got {dr}"
                    )))
                }
            }
        }
        IfChainKind::LoraMulti => {
            match resolved.bandwidth {
                Bandwidth::Default => resolved.bandwidth = Bandwidth::Khz125,
                Bandwidth::Khz125 => {}
                bw => {
                    return Err(invalid(format!(
                        "IF chain {index} ({kind}) only supports 125kHz, got {bw}"
                    )))
                }
            }
            match resolved.datarate {
                DataRate::Default => resolved.datarate = DataRate::LoraMulti,
                DataRate::LoraMulti => {}
                dr if dr.is_single_sf() => {}
                dr => {
                    return Err(invalid(format!(
                        "IF chain {index} ({kind}) cannot demodulate {dr}"
                    )))
                }
            }
        }
        IfChainKind::FskStd => {
            if resolved.bandwidth == Bandwidth::Default {
                resolved.bandwidth = Bandwidth::Khz250;
            }
            match resolved.datarate {
                DataRate::Default => resolved.datarate = DataRate::Fsk(FSK_DEFAULT_DATARATE),
                DataRate::Fsk(bps) if (FSK_DATARATE_MIN..=FSK_DATARATE_MAX).contains(&bps) => {}
                dr => {
                    return Err(invalid(format!(
                        "IF chain {index} ({kind}) needs an FSK bitrate in \
                         {FSK_DATARATE_MIN}..={FSK_DATARATE_MAX} bps, got {dr}"
                    )))
                }
            }
        }
    }
    Ok(resolved)
}
