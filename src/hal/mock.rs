//! Mock concentrator for testing
//!
//! [`MockTransport`] keeps its state behind an `Arc<Mutex<_>>`, so a test can
//! hold a clone, hand the other one to a gateway, and then queue packets,
//! inject failures or inspect what the gateway programmed and staged.

use crate::config::ChannelPlan;
use crate::constants::RF_CHAIN_COUNT;
use crate::hal::{RadioTransport, TimeSource, TransportError, TxCapabilities, TxStatus};
use crate::radio::{RxPacket, TxJob, TxTrigger};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MockState {
    fifo: VecDeque<RxPacket>,
    pending_overflow: Option<u32>,
    programmed: Vec<ChannelPlan>,
    teardown_calls: usize,
    read_calls: usize,
    staged: Vec<TxJob>,
    counter_us: u32,
    tx_status: [TxStatus; RF_CHAIN_COUNT],
    capabilities: TxCapabilities,
    ignore_max: bool,
    program_error: Option<TransportError>,
    teardown_error: Option<TransportError>,
    read_error: Option<TransportError>,
    stage_error: Option<TransportError>,
    status_error: Option<TransportError>,
    counter_error: Option<TransportError>,
}

/// In-memory concentrator
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        let mock = Self::default();
        mock.lock().tx_status = [TxStatus::Off; RF_CHAIN_COUNT];
        mock
    }

    pub fn with_capabilities(capabilities: TxCapabilities) -> Self {
        let mock = Self::new();
        mock.lock().capabilities = capabilities;
        mock
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a packet in the receive FIFO
    pub fn push_rx(&self, pkt: RxPacket) {
        self.lock().fifo.push_back(pkt);
    }

    pub fn push_rx_many<I: IntoIterator<Item = RxPacket>>(&self, pkts: I) {
        self.lock().fifo.extend(pkts);
    }

    /// Packets still waiting in the FIFO
    pub fn fifo_len(&self) -> usize {
        self.lock().fifo.len()
    }

    /// Report an overflow on the next read; queued packets stay put
    pub fn signal_overflow(&self, dropped: u32) {
        self.lock().pending_overflow = Some(dropped);
    }

    /// Return every queued packet on a read regardless of `max`
    pub fn set_ignore_max(&self, ignore: bool) {
        self.lock().ignore_max = ignore;
    }

    pub fn set_counter(&self, counter_us: u32) {
        self.lock().counter_us = counter_us;
    }

    pub fn advance_counter(&self, delta_us: u32) {
        let mut state = self.lock();
        state.counter_us = state.counter_us.wrapping_add(delta_us);
    }

    pub fn set_capabilities(&self, capabilities: TxCapabilities) {
        self.lock().capabilities = capabilities;
    }

    pub fn set_tx_status(&self, rf_chain: usize, status: TxStatus) {
        if let Some(slot) = self.lock().tx_status.get_mut(rf_chain) {
            *slot = status;
        }
    }

    /// Mark every staged or emitting chain as free again
    pub fn complete_transmissions(&self) {
        for status in self.lock().tx_status.iter_mut() {
            if status.is_busy() {
                *status = TxStatus::Free;
            }
        }
    }

    pub fn fail_next_program(&self, err: TransportError) {
        self.lock().program_error = Some(err);
    }

    pub fn fail_next_teardown(&self, err: TransportError) {
        self.lock().teardown_error = Some(err);
    }

    pub fn fail_next_read(&self, err: TransportError) {
        self.lock().read_error = Some(err);
    }

    pub fn fail_next_stage(&self, err: TransportError) {
        self.lock().stage_error = Some(err);
    }

    pub fn fail_next_status(&self, err: TransportError) {
        self.lock().status_error = Some(err);
    }

    pub fn fail_next_counter(&self, err: TransportError) {
        self.lock().counter_error = Some(err);
    }

    /// Every plan programmed so far, oldest first
    pub fn programmed_plans(&self) -> Vec<ChannelPlan> {
        self.lock().programmed.clone()
    }

    pub fn teardown_calls(&self) -> usize {
        self.lock().teardown_calls
    }

    /// Number of times the FIFO was read
    pub fn read_calls(&self) -> usize {
        self.lock().read_calls
    }

    /// Every job staged so far, oldest first
    pub fn staged_jobs(&self) -> Vec<TxJob> {
        self.lock().staged.clone()
    }
}

impl RadioTransport for MockTransport {
    fn program_topology(&mut self, plan: &ChannelPlan) -> Result<(), TransportError> {
        let mut state = self.lock();
        if let Some(err) = state.program_error.take() {
            return Err(err);
        }
        state.programmed.push(plan.clone());
        for (status, rf) in state.tx_status.iter_mut().zip(plan.rf_chains.iter()) {
            *status = if rf.enable { TxStatus::Free } else { TxStatus::Off };
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<(), TransportError> {
        let mut state = self.lock();
        state.teardown_calls += 1;
        state.tx_status = [TxStatus::Off; RF_CHAIN_COUNT];
        match state.teardown_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn read_available_packets(&mut self, max: usize) -> Result<Vec<RxPacket>, TransportError> {
        let mut state = self.lock();
        state.read_calls += 1;
        if let Some(err) = state.read_error.take() {
            return Err(err);
        }
        if let Some(dropped) = state.pending_overflow.take() {
            return Err(TransportError::Overflow { dropped });
        }
        let count = if state.ignore_max {
            state.fifo.len()
        } else {
            max.min(state.fifo.len())
        };
        Ok(state.fifo.drain(..count).collect())
    }

    fn stage_transmit(&mut self, job: &TxJob) -> Result<(), TransportError> {
        let mut state = self.lock();
        if let Some(err) = state.stage_error.take() {
            return Err(err);
        }
        let chain = usize::from(job.rf_chain());
        let status = match job.trigger {
            TxTrigger::Immediate => TxStatus::Emitting,
            _ => TxStatus::Scheduled,
        };
        match state.tx_status.get_mut(chain) {
            Some(slot) => *slot = status,
            None => {
                return Err(TransportError::Rejected(format!(
                    "no TX modem on RF chain {chain}"
                )))
            }
        }
        state.staged.push(job.clone());
        Ok(())
    }

    fn current_counter_us(&mut self) -> Result<u32, TransportError> {
        let mut state = self.lock();
        match state.counter_error.take() {
            Some(err) => Err(err),
            None => Ok(state.counter_us),
        }
    }

    fn tx_status(&mut self, rf_chain: u8) -> Result<TxStatus, TransportError> {
        let mut state = self.lock();
        if let Some(err) = state.status_error.take() {
            return Err(err);
        }
        state
            .tx_status
            .get(usize::from(rf_chain))
            .copied()
            .ok_or_else(|| TransportError::Rejected(format!("no TX modem on RF chain {rf_chain}")))
    }

    fn capabilities(&self) -> TxCapabilities {
        self.lock().capabilities
    }
}

/// Time source whose fix is set by hand
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fix(time: DateTime<Utc>) -> Self {
        let source = Self::new();
        source.set(time);
        source
    }

    pub fn set(&self, time: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = Some(time);
    }

    /// Drop the fix
    pub fn clear(&self) {
        *self.now.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }
}

impl TimeSource for ManualTimeSource {
    fn current_gps_time(&self) -> Option<DateTime<Utc>> {
        *self.now.lock().unwrap_or_else(|p| p.into_inner())
    }
}
