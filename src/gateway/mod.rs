//! # Gateway Lifecycle Controller
//!
//! [`Gateway`] owns a transport, the channel store and the lifecycle state:
//!
//! ```text
//!            start() ok
//!   Idle ─────────────────▶ Running
//!    ▲                         │
//!    └─────────────────────────┘
//!            stop()
//! ```
//!
//! Channel configuration is only accepted while `Idle`; `receive` and `send`
//! (see [`rx`] and [`tx`]) only while `Running`. A failed `start` leaves the
//! gateway `Idle`; `stop` always ends `Idle`, even when the hardware reports
//! an error while shutting down.

use crate::config::{ChannelPlan, ChannelStore, IfChainConfig, RfChainConfig};
use crate::constants::RF_CHAIN_COUNT;
use crate::error::{GatewayError, Result};
use crate::hal::{NoTimeSource, RadioTransport, TimeSource, TxStatus};
use crate::radio::{HardwareTopology, RxPacket, TxJob};
use crate::stats::GatewayStats;
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::fmt;

pub mod rx;
pub mod shared;
pub mod tx;

pub use shared::SharedGateway;
pub use tx::counter_is_ahead;

/// Lifecycle state of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GatewayState {
    #[default]
    Idle,
    Running,
}

impl fmt::Display for GatewayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayState::Idle => write!(f, "idle"),
            GatewayState::Running => write!(f, "running"),
        }
    }
}

/// One concentrator behind a transport
pub struct Gateway<T: RadioTransport> {
    transport: T,
    topology: HardwareTopology,
    store: ChannelStore,
    state: GatewayState,
    /// Plan programmed by the last successful `start`, `None` while idle
    plan: Option<ChannelPlan>,
    /// Last job staged on each RF chain since `start`
    pending: [Option<TxJob>; RF_CHAIN_COUNT],
    /// Valid packets held back from a rejected receive batch
    rx_backlog: VecDeque<RxPacket>,
    time_source: Box<dyn TimeSource + Send>,
    stats: GatewayStats,
}

impl<T: RadioTransport> Gateway<T> {
    /// Gateway for the reference board, without GPS
    pub fn new(transport: T) -> Self {
        Self::with_topology(transport, HardwareTopology::reference())
    }

    /// Gateway for a board described by `topology`
    ///
    /// The gateway starts `Idle` with every chain disabled.
    pub fn with_topology(transport: T, topology: HardwareTopology) -> Self {
        Self {
            transport,
            topology,
            store: ChannelStore::new(),
            state: GatewayState::Idle,
            plan: None,
            pending: Default::default(),
            rx_backlog: VecDeque::new(),
            time_source: Box::new(NoTimeSource),
            stats: GatewayStats::default(),
        }
    }

    /// Attach a GPS time source, enabling the GPS-gated TX modes
    pub fn with_time_source<S: TimeSource + Send + 'static>(mut self, source: S) -> Self {
        self.time_source = Box::new(source);
        self
    }

    /// Replace the GPS time source, idle or running
    pub fn set_time_source<S: TimeSource + Send + 'static>(&mut self, source: S) {
        self.time_source = Box::new(source);
    }

    /// Current lifecycle state
    pub fn state(&self) -> GatewayState {
        self.state
    }

    /// True between a successful `start` and the next `stop`
    pub fn is_running(&self) -> bool {
        self.state == GatewayState::Running
    }

    /// Board description the gateway validates against
    pub fn topology(&self) -> &HardwareTopology {
        &self.topology
    }

    /// Counters since the last successful `start`
    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// Plan programmed by the last successful `start`, `None` while idle
    pub fn active_plan(&self) -> Option<&ChannelPlan> {
        self.plan.as_ref()
    }

    /// Replace the configuration of RF chain `index`
    ///
    /// # Returns
    /// * `InvalidState` while running, with the store left untouched
    /// * `InvalidIndex` when `index` is not an RF chain
    /// * `InvalidConfig` when the frequency is outside the chain's RX band
    pub fn set_rf_chain_config(&mut self, index: u8, config: RfChainConfig) -> Result<()> {
        self.ensure_idle()?;
        self.store.set_rf(&self.topology, index, config)?;
        debug!(
            "RF chain {index} set: enable={} freq={} Hz",
            config.enable, config.freq_hz
        );
        Ok(())
    }

    /// Replace the configuration of IF chain `index`
    ///
    /// # Returns
    /// * `InvalidState` while running, with the store left untouched
    /// * `InvalidIndex` when `index` is not an IF chain
    /// * `InvalidConfig` when the configuration does not fit the chain's modem
    pub fn set_if_chain_config(&mut self, index: u8, config: IfChainConfig) -> Result<()> {
        self.ensure_idle()?;
        self.store.set_if(&self.topology, index, config)?;
        debug!(
            "IF chain {index} set: enable={} rf_chain={} offset={} Hz bw={} dr={}",
            config.enable, config.rf_chain, config.freq_hz, config.bandwidth, config.datarate
        );
        Ok(())
    }

    /// Stored configuration of RF chain `index`, as written
    ///
    /// # Returns
    /// * `InvalidIndex` when `index` is not an RF chain
    pub fn rf_chain_config(&self, index: u8) -> Result<RfChainConfig> {
        self.store.rf_chain(index)
    }

    /// Stored configuration of IF chain `index`, as written
    ///
    /// Defaults are only resolved in the plan built by `start`.
    ///
    /// # Returns
    /// * `InvalidIndex` when `index` is not an IF chain
    pub fn if_chain_config(&self, index: u8) -> Result<IfChainConfig> {
        self.store.if_chain(index)
    }

    /// Validate the channel store, program the hardware and enter `Running`
    ///
    /// # Returns
    /// * `AlreadyRunning` when the gateway is already started
    /// * `InvalidConfig` when the store does not form a usable plan
    /// * `HardwareInitError` when the transport could not program the plan;
    ///   the hardware is torn down again on a best-effort basis
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            warn!("start() called while already running");
            return Err(GatewayError::AlreadyRunning);
        }

        let plan = self.store.build_plan(&self.topology)?;
        for (i, rf) in plan.rf_chains.iter().enumerate().filter(|(_, rf)| rf.enable) {
            debug!("RF chain {i}: {} Hz", rf.freq_hz);
        }
        for (i, chain) in plan.enabled_if_chains() {
            debug!(
                "IF chain {i} ({}): rf_chain={} offset={} Hz {} {}",
                chain.kind,
                chain.config.rf_chain,
                chain.config.freq_hz,
                chain.config.bandwidth,
                chain.config.datarate
            );
        }

        if let Err(e) = self.transport.program_topology(&plan) {
            error!("Failed to program concentrator: {e}");
            if let Err(teardown_err) = self.transport.teardown() {
                warn!("Teardown after failed start also failed: {teardown_err}");
            }
            return Err(GatewayError::HardwareInitError(e));
        }

        info!(
            "Gateway started: {} RF chain(s), {} IF chain(s) enabled",
            plan.rf_chains.iter().filter(|rf| rf.enable).count(),
            plan.enabled_if_chains().count()
        );
        self.plan = Some(plan);
        self.pending = Default::default();
        self.rx_backlog.clear();
        self.stats = GatewayStats::default();
        self.state = GatewayState::Running;
        Ok(())
    }

    /// Tear the hardware down and return to `Idle`
    ///
    /// Pending transmissions are abandoned. The gateway is `Idle` afterwards
    /// even when teardown fails; the failure is then reported as
    /// `HardwareWriteError`.
    pub fn stop(&mut self) -> Result<()> {
        if !self.is_running() {
            debug!("stop() called while idle");
            return Err(GatewayError::NotRunning);
        }

        let result = self.transport.teardown();

        let abandoned = self.pending.iter().filter(|job| job.is_some()).count();
        self.pending = Default::default();
        self.rx_backlog.clear();
        self.plan = None;
        self.state = GatewayState::Idle;

        match result {
            Ok(()) => {
                info!("Gateway stopped ({abandoned} pending transmission(s) dropped)");
                Ok(())
            }
            Err(e) => {
                error!("Gateway stopped, but teardown failed: {e}");
                Err(GatewayError::HardwareWriteError(e))
            }
        }
    }

    /// Current value of the concentrator's microsecond counter
    ///
    /// # Returns
    /// * `NotRunning` while idle
    /// * `HardwareReadError` when the counter cannot be read
    pub fn instant_counter(&mut self) -> Result<u32> {
        self.ensure_running()?;
        self.transport
            .current_counter_us()
            .map_err(GatewayError::HardwareReadError)
    }

    /// TX modem state of `rf_chain`
    ///
    /// # Returns
    /// * `NotRunning` while idle
    /// * `InvalidIndex` when `rf_chain` is not an RF chain
    /// * `HardwareReadError` when the status cannot be read
    pub fn tx_status(&mut self, rf_chain: u8) -> Result<TxStatus> {
        self.ensure_running()?;
        if usize::from(rf_chain) >= RF_CHAIN_COUNT {
            return Err(GatewayError::InvalidIndex {
                index: usize::from(rf_chain),
                count: RF_CHAIN_COUNT,
            });
        }
        self.transport
            .tx_status(rf_chain)
            .map_err(GatewayError::HardwareReadError)
    }

    /// Jobs staged since `start` that the hardware has not confirmed done
    ///
    /// An entry is dropped once its RF chain reports `Free` or `Off`.
    ///
    /// # Returns
    /// * `NotRunning` while idle
    /// * `HardwareReadError` when a chain status cannot be read
    pub fn pending_transmissions(&mut self) -> Result<Vec<TxJob>> {
        self.ensure_running()?;

        let mut still_pending = Vec::new();
        for (chain, slot) in self.pending.iter_mut().enumerate() {
            let Some(job) = slot else { continue };
            let status = self
                .transport
                .tx_status(chain as u8)
                .map_err(GatewayError::HardwareReadError)?;
            if status.is_idle() {
                debug!("RF chain {chain} reports {status}, job complete");
                *slot = None;
            } else {
                still_pending.push(job.clone());
            }
        }
        Ok(still_pending)
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.state {
            GatewayState::Idle => Ok(()),
            state => {
                debug!("Configuration refused while {state}");
                Err(GatewayError::InvalidState(state))
            }
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_running() {
            Ok(())
        } else {
            Err(GatewayError::NotRunning)
        }
    }
}

impl<T: RadioTransport> fmt::Debug for Gateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("state", &self.state)
            .field("plan", &self.plan)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
