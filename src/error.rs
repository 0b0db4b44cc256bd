//! # Gateway Error Handling
//!
//! This module defines the GatewayError enum, which represents every way a
//! configuration, lifecycle, receive or transmit call can fail.

use crate::gateway::GatewayState;
use crate::hal::TransportError;
use crate::radio::TxMode;
use thiserror::Error;

/// Represents the different error types that can occur in the gateway HAL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// A chain index past the end of its table.
    #[error("Invalid chain index {index} (valid range 0..{count})")]
    InvalidIndex { index: usize, count: usize },

    /// A configuration or packet field that breaks a cross-field rule.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The call is not legal in the current lifecycle state.
    #[error("Operation not allowed while {0}")]
    InvalidState(GatewayState),

    /// `start` called on a running gateway.
    #[error("Gateway is already running")]
    AlreadyRunning,

    /// The call requires a running gateway.
    #[error("Gateway is not running")]
    NotRunning,

    /// The transport failed to program the channel plan.
    #[error("Hardware initialization failed: {0}")]
    HardwareInitError(#[source] TransportError),

    /// The transport failed while reading from the concentrator.
    #[error("Hardware read failed: {0}")]
    HardwareReadError(#[source] TransportError),

    /// The transport failed while writing to the concentrator.
    #[error("Hardware write failed: {0}")]
    HardwareWriteError(#[source] TransportError),

    /// A timestamped transmission whose target is not in the future.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// The board has no input for this trigger mode.
    #[error("TX mode {0} not supported by this hardware")]
    UnsupportedMode(TxMode),

    /// A GPS-gated transmission without a GPS time reference.
    #[error("No GPS time reference available")]
    NoTimeSource,

    /// The RF chain already has a packet staged or on air.
    #[error("RF chain {0} is busy")]
    ChainBusy(u8),
}

impl GatewayError {
    /// True for errors raised by the transport rather than by validation
    pub fn is_hardware(&self) -> bool {
        matches!(
            self,
            GatewayError::HardwareInitError(_)
                | GatewayError::HardwareReadError(_)
                | GatewayError::HardwareWriteError(_)
        )
    }

    /// The transport error behind a hardware failure
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            GatewayError::HardwareInitError(e)
            | GatewayError::HardwareReadError(e)
            | GatewayError::HardwareWriteError(e) => Some(e),
            _ => None,
        }
    }
}

/// Result alias used across the gateway API.
pub type Result<T> = std::result::Result<T, GatewayError>;
