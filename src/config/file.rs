//! JSON gateway configuration
//!
//! A packet-forwarder style description of the channel plan:
//!
//! ```json
//! {
//!   "radios": [ { "enable": true, "freq": 867500000 },
//!               { "enable": true, "freq": 868500000 } ],
//!   "chans":  [ { "enable": true, "radio": 1, "if": -400000 },
//!               { "enable": true, "radio": 0, "if": 300000,
//!                 "bandwidth": 250000, "datarate": "sf7" } ]
//! }
//! ```
//!
//! Entries are applied in order through the regular store calls, so a file
//! can never put the gateway into a state the API would have refused.

use crate::config::channels::{IfChainConfig, RfChainConfig};
use crate::constants::{IF_CHAIN_COUNT, RF_CHAIN_COUNT};
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::hal::RadioTransport;
use crate::radio::{Bandwidth, DataRate};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or applying a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration rejected by gateway: {0}")]
    Gateway(#[from] GatewayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RadioConf {
    #[serde(default)]
    pub enable: bool,
    /// Center frequency in Hz
    #[serde(default)]
    pub freq: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChanConf {
    #[serde(default)]
    pub enable: bool,
    /// RF chain index
    #[serde(default)]
    pub radio: u8,
    /// Offset from the radio center frequency, in Hz
    #[serde(rename = "if", default)]
    pub offset: i32,
    #[serde(default)]
    pub bandwidth: Bandwidth,
    #[serde(default)]
    pub datarate: DataRate,
}

impl From<RadioConf> for RfChainConfig {
    fn from(conf: RadioConf) -> Self {
        RfChainConfig {
            enable: conf.enable,
            freq_hz: conf.freq,
        }
    }
}

impl From<ChanConf> for IfChainConfig {
    fn from(conf: ChanConf) -> Self {
        IfChainConfig {
            enable: conf.enable,
            rf_chain: conf.radio,
            freq_hz: conf.offset,
            bandwidth: conf.bandwidth,
            datarate: conf.datarate,
        }
    }
}

/// Channel plan as stored on disk; the position in each list is the chain index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GatewayConf {
    #[serde(default)]
    pub radios: Vec<RadioConf>,
    #[serde(default)]
    pub chans: Vec<ChanConf>,
}

impl GatewayConf {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Snapshot the channel store of `gateway`
    pub fn from_gateway<T: RadioTransport>(gateway: &Gateway<T>) -> Result<Self, GatewayError> {
        let mut conf = GatewayConf::default();
        for i in 0..RF_CHAIN_COUNT as u8 {
            let rf = gateway.rf_chain_config(i)?;
            conf.radios.push(RadioConf {
                enable: rf.enable,
                freq: rf.freq_hz,
            });
        }
        for i in 0..IF_CHAIN_COUNT as u8 {
            let chan = gateway.if_chain_config(i)?;
            conf.chans.push(ChanConf {
                enable: chan.enable,
                radio: chan.rf_chain,
                offset: chan.freq_hz,
                bandwidth: chan.bandwidth,
                datarate: chan.datarate,
            });
        }
        Ok(conf)
    }

    /// Write every radio and channel into the gateway's store
    ///
    /// Stops at the first slot the gateway rejects; slots before it stay
    /// applied.
    pub fn apply<T: RadioTransport>(&self, gateway: &mut Gateway<T>) -> Result<(), GatewayError> {
        for (i, radio) in self.radios.iter().enumerate() {
            gateway.set_rf_chain_config(chain_index(i, RF_CHAIN_COUNT)?, (*radio).into())?;
        }
        for (i, chan) in self.chans.iter().enumerate() {
            gateway.set_if_chain_config(chain_index(i, IF_CHAIN_COUNT)?, (*chan).into())?;
        }
        info!(
            "Applied configuration: {} radio(s), {} channel(s)",
            self.radios.len(),
            self.chans.len()
        );
        Ok(())
    }
}

fn chain_index(index: usize, count: usize) -> Result<u8, GatewayError> {
    u8::try_from(index).map_err(|_| GatewayError::InvalidIndex { index, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let conf = GatewayConf::from_json_str(r#"{"chans":[{"enable":true}]}"#).unwrap();
        assert!(conf.radios.is_empty());
        assert_eq!(conf.chans[0].bandwidth, Bandwidth::Default);
        assert_eq!(conf.chans[0].datarate, DataRate::Default);
        assert_eq!(conf.chans[0].radio, 0);
    }

    #[test]
    fn test_if_key_maps_to_offset() {
        let conf =
            GatewayConf::from_json_str(r#"{"chans":[{"enable":true,"radio":1,"if":-200000}]}"#)
                .unwrap();
        let cfg: IfChainConfig = conf.chans[0].into();
        assert_eq!(cfg.freq_hz, -200_000);
        assert_eq!(cfg.rf_chain, 1);
    }

    #[test]
    fn test_bad_bandwidth_is_parse_error() {
        let err = GatewayConf::from_json_str(r#"{"chans":[{"bandwidth":200000}]}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
