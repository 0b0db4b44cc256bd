//! Radio-level vocabulary: modulation codes, board topology, packet records
//! and time-on-air estimation.

pub mod airtime;
pub mod modulation;
pub mod packet;
pub mod topology;

pub use airtime::time_on_air_us;
pub use modulation::{
    Bandwidth, CodeRate, CrcStatus, DataRate, Modulation, TxMode, UnknownCode,
};
pub use packet::{RxPacket, TxJob, TxPacket, TxTrigger};
pub use topology::{pll_register, FreqBand, HardwareTopology, IfChainKind};
