//! # loragw-hal - Hardware Abstraction Layer for LoRa/FSK Packet Gateways
//!
//! The loragw-hal crate drives a multi-channel LoRa/FSK concentrator: two RF
//! front-ends (RF chains) feeding ten demodulators (IF chains), a bounded
//! receive FIFO and one transmitter per RF chain.
//!
//! ## Features
//!
//! - Configure RF and IF chains, validated against the board's modem layout
//! - Start and stop the radio subsystem through a strict `Idle`/`Running` lifecycle
//! - Drain received packets without blocking, in arrival order
//! - Schedule transmissions immediately, on a counter timestamp, on an external
//!   event or on a GPS pulse-per-second edge
//! - Load channel plans from packet-forwarder style JSON files
//! - Support for logging, statistics and error handling
//!
//! The bus to the chip is not part of this crate: plug in any
//! [`RadioTransport`], or use [`hal::mock::MockTransport`] to run without
//! hardware.
//!
//! ## Usage
//!
//! ```rust
//! use loragw_hal::hal::mock::MockTransport;
//! use loragw_hal::{Gateway, IfChainConfig, RfChainConfig, TxPacket};
//!
//! let mut gw = Gateway::new(MockTransport::new());
//! gw.set_rf_chain_config(0, RfChainConfig::enabled(868_500_000)).unwrap();
//! gw.set_if_chain_config(0, IfChainConfig::enabled(0, -200_000)).unwrap();
//! gw.start().unwrap();
//!
//! let packets = gw.receive(8).unwrap();
//! assert!(packets.is_empty());
//!
//! gw.send(&TxPacket {
//!     freq_hz: 868_100_000,
//!     rf_power: 14,
//!     payload: bytes::Bytes::from_static(b"ping"),
//!     ..Default::default()
//! })
//! .unwrap();
//! gw.stop().unwrap();
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod gateway;
pub mod hal;
pub mod logging;
pub mod radio;
pub mod stats;

pub use crate::error::{GatewayError, Result};
pub use crate::logging::{init_logger, init_logger_with_level};

pub use config::{ChannelPlan, ConfigError, GatewayConf, IfChainConfig, RfChainConfig};
pub use gateway::{counter_is_ahead, Gateway, GatewayState, SharedGateway};
pub use hal::{NoTimeSource, RadioTransport, TimeSource, TransportError, TxCapabilities, TxStatus};
pub use radio::{
    Bandwidth, CodeRate, CrcStatus, DataRate, HardwareTopology, IfChainKind, Modulation, RxPacket,
    TxJob, TxMode, TxPacket, TxTrigger,
};
pub use stats::GatewayStats;
