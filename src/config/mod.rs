//! Channel configuration: the in-memory store validated against the board
//! topology, and its JSON file representation.

pub mod channels;
pub mod file;

pub use channels::{ChannelPlan, ChannelStore, IfChainConfig, ResolvedIfChain, RfChainConfig};
pub use file::{ChanConf, ConfigError, GatewayConf, RadioConf};
