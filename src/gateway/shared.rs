//! Thread-safe handle to a gateway
//!
//! The concentrator is a single device, so every call that can touch it goes
//! through one mutex. Clones share the same gateway. A panic while the lock is
//! held does not leave the gateway half-transitioned (each state change is a
//! single assignment after the hardware call), so a poisoned lock is simply
//! taken over.

use super::{Gateway, GatewayState};
use crate::config::{IfChainConfig, RfChainConfig};
use crate::error::Result;
use crate::hal::{RadioTransport, TxStatus};
use crate::radio::{RxPacket, TxPacket};
use crate::stats::GatewayStats;
use std::sync::{Arc, Mutex, MutexGuard};

/// Cloneable, thread-safe handle to one [`Gateway`]
pub struct SharedGateway<T: RadioTransport> {
    inner: Arc<Mutex<Gateway<T>>>,
}

impl<T: RadioTransport> Clone for SharedGateway<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: RadioTransport> SharedGateway<T> {
    /// Wrap `gateway`; further access goes through the handle
    pub fn new(gateway: Gateway<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(gateway)),
        }
    }

    /// Exclusive access to the gateway for a sequence of calls
    pub fn lock(&self) -> MutexGuard<'_, Gateway<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// See [`Gateway::set_rf_chain_config`]
    pub fn set_rf_chain_config(&self, index: u8, config: RfChainConfig) -> Result<()> {
        self.lock().set_rf_chain_config(index, config)
    }

    /// See [`Gateway::set_if_chain_config`]
    pub fn set_if_chain_config(&self, index: u8, config: IfChainConfig) -> Result<()> {
        self.lock().set_if_chain_config(index, config)
    }

    /// See [`Gateway::start`]
    pub fn start(&self) -> Result<()> {
        self.lock().start()
    }

    /// See [`Gateway::stop`]
    pub fn stop(&self) -> Result<()> {
        self.lock().stop()
    }

    /// See [`Gateway::receive`]
    pub fn receive(&self, max_packets: usize) -> Result<Vec<RxPacket>> {
        self.lock().receive(max_packets)
    }

    /// See [`Gateway::send`]
    pub fn send(&self, pkt: &TxPacket) -> Result<()> {
        self.lock().send(pkt)
    }

    /// See [`Gateway::instant_counter`]
    pub fn instant_counter(&self) -> Result<u32> {
        self.lock().instant_counter()
    }

    /// See [`Gateway::tx_status`]
    pub fn tx_status(&self, rf_chain: u8) -> Result<TxStatus> {
        self.lock().tx_status(rf_chain)
    }

    /// Current lifecycle state
    pub fn state(&self) -> GatewayState {
        self.lock().state()
    }

    /// Snapshot of the gateway's counters
    pub fn stats(&self) -> GatewayStats {
        *self.lock().stats()
    }
}

impl<T: RadioTransport> From<Gateway<T>> for SharedGateway<T> {
    fn from(gateway: Gateway<T>) -> Self {
        Self::new(gateway)
    }
}
