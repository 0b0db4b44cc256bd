//! # Concentrator Hardware Abstraction
//!
//! The gateway never touches registers itself. Everything that reaches the
//! concentrator goes through a [`RadioTransport`]: programming a validated
//! channel plan, draining the receive FIFO, staging a transmission and
//! reading the free-running microsecond counter. A GPS-disciplined clock, when
//! present, is reached through a [`TimeSource`].
//!
//! [`mock`] provides in-memory implementations of both traits for tests and
//! for running the gateway logic without a board attached.

use crate::config::ChannelPlan;
use crate::radio::{RxPacket, TxJob};
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

pub mod mock;

/// Errors reported by a transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("bus communication error: {0}")]
    Bus(String),

    #[error("timeout waiting for the concentrator")]
    Timeout,

    /// The receive FIFO overflowed and packets were lost before they could
    /// be drained
    #[error("receive FIFO overflow, {dropped} packet(s) dropped")]
    Overflow { dropped: u32 },

    /// The transport returned data that breaks its contract
    #[error("malformed data from transport: {0}")]
    Malformed(String),

    #[error("request rejected by the concentrator: {0}")]
    Rejected(String),
}

/// State of the TX modem of one RF chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum TxStatus {
    #[default]
    Unknown = 0,
    /// Chain not started
    Off = 1,
    /// Nothing staged
    Free = 2,
    /// A packet is staged and waiting for its trigger
    Scheduled = 3,
    /// A packet is on air
    Emitting = 4,
}

impl TxStatus {
    /// Whether a new packet would collide with one already staged or on air
    pub fn is_busy(self) -> bool {
        matches!(self, TxStatus::Scheduled | TxStatus::Emitting)
    }

    /// True when the chain has nothing outstanding
    ///
    /// `Unknown` is neither busy nor idle.
    pub fn is_idle(self) -> bool {
        matches!(self, TxStatus::Free | TxStatus::Off)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TxStatus::Unknown => "unknown",
            TxStatus::Off => "off",
            TxStatus::Free => "free",
            TxStatus::Scheduled => "scheduled",
            TxStatus::Emitting => "emitting",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Optional trigger sources wired to the concentrator
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TxCapabilities: u8 {
        /// External trigger input for `OnEvent` / `EventDelayed`
        const EVENT_TRIGGER = 0b0000_0001;
        /// GPS pulse-per-second input for `OnGps` / `GpsDelayed`
        const GPS_TRIGGER   = 0b0000_0010;
    }
}

/// Link between the gateway and the concentrator hardware
///
/// Implementations own the bus (SPI, USB, or a simulation) and translate
/// these calls into register traffic. None of them are called concurrently;
/// the gateway serializes access.
pub trait RadioTransport {
    /// Program the radios and demodulators with a validated plan
    ///
    /// # Returns
    /// * `Ok(())` when every chain is configured
    /// * `Err(TransportError)` when the hardware could not be set up
    fn program_topology(&mut self, plan: &ChannelPlan) -> Result<(), TransportError>;

    /// Power down radios and demodulators
    fn teardown(&mut self) -> Result<(), TransportError>;

    /// Pop at most `max` packets out of the receive FIFO, oldest first
    ///
    /// An empty vector means the FIFO is empty. `Overflow` reports packets
    /// the hardware lost; the packets still queued remain readable.
    fn read_available_packets(&mut self, max: usize) -> Result<Vec<RxPacket>, TransportError>;

    /// Hand a validated packet to the TX modem of its RF chain
    fn stage_transmit(&mut self, job: &TxJob) -> Result<(), TransportError>;

    /// Current value of the free-running 32-bit microsecond counter
    fn current_counter_us(&mut self) -> Result<u32, TransportError>;

    /// TX modem state of an RF chain
    fn tx_status(&mut self, rf_chain: u8) -> Result<TxStatus, TransportError>;

    /// Trigger inputs available on this board
    fn capabilities(&self) -> TxCapabilities {
        TxCapabilities::empty()
    }

    fn supports_event_trigger(&self) -> bool {
        self.capabilities().contains(TxCapabilities::EVENT_TRIGGER)
    }

    fn supports_gps_trigger(&self) -> bool {
        self.capabilities().contains(TxCapabilities::GPS_TRIGGER)
    }
}

/// Source of absolute GPS time
pub trait TimeSource {
    /// GPS time of the last pulse-per-second edge, `None` without a fix
    fn current_gps_time(&self) -> Option<DateTime<Utc>>;
}

/// Time source for gateways without a GPS receiver
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTimeSource;

impl TimeSource for NoTimeSource {
    fn current_gps_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}
