//! Transmit Scheduler
//!
//! `send` validates an outbound packet against the running channel plan and
//! the board, resolves every "default" field, works out what triggers the
//! transmission and hands the resulting [`TxJob`] to the transport. Nothing
//! is retried; a refused packet leaves the gateway exactly as it was.
//!
//! Checks run in a fixed order, so a packet with several problems always
//! reports the same one:
//!
//! 1. gateway running
//! 2. payload fits the data buffer
//! 3. RF chain exists and is enabled
//! 4. frequency and power
//! 5. modulation parameters
//! 6. trigger mode
//! 7. RF chain free
//! 8. hand-off to the transport

use super::Gateway;
use crate::constants::{
    COUNTER_HALF_RANGE, FSK_DATARATE_MAX, FSK_DATARATE_MIN, FSK_DEFAULT_DATARATE,
    FSK_DEFAULT_PREAMBLE, FSK_FDEV_MAX_KHZ, FSK_FDEV_MIN_KHZ, LORA_DEFAULT_PREAMBLE,
    LORA_MIN_PREAMBLE, MAX_PAYLOAD_SIZE, MODEM_MAX_PAYLOAD_SIZE, RF_CHAIN_COUNT,
};
use crate::error::{GatewayError, Result};
use crate::hal::RadioTransport;
use crate::logging::log_tx_packet;
use crate::radio::{Bandwidth, CodeRate, DataRate, Modulation, TxJob, TxMode, TxPacket, TxTrigger};
use log::{debug, error, info};

/// Whether `target` lies strictly ahead of `now` on the wrapping 32-bit
/// microsecond counter
///
/// Targets up to 2^31 - 1 µs ahead count as future; `target == now` and
/// anything further away count as past.
pub fn counter_is_ahead(target: u32, now: u32) -> bool {
    let delta = target.wrapping_sub(now);
    delta != 0 && delta < COUNTER_HALF_RANGE
}

impl<T: RadioTransport> Gateway<T> {
    /// Schedule `pkt` for transmission
    ///
    /// # Returns
    /// * `NotRunning` while idle
    /// * `InvalidConfig` for a packet the chain or its modem cannot send
    /// * `InvalidSchedule` for a timestamp that is not in the future
    /// * `NoTimeSource` for a GPS-gated packet without a GPS time
    /// * `UnsupportedMode` for a trigger the board has no input for
    /// * `ChainBusy` when the RF chain already has a packet staged or on air
    /// * `HardwareReadError` / `HardwareWriteError` when the transport fails
    pub fn send(&mut self, pkt: &TxPacket) -> Result<()> {
        self.ensure_running()?;

        match self.stage(pkt) {
            Ok(job) => {
                let chain = usize::from(job.rf_chain());
                info!(
                    "Staged {} TX on RF chain {chain} ({} us on air)",
                    job.packet.tx_mode, job.airtime_us
                );
                self.stats.tx_staged += 1;
                self.pending[chain] = Some(job);
                Ok(())
            }
            Err(e) => {
                self.stats.tx_rejected += 1;
                Err(e)
            }
        }
    }

    fn stage(&mut self, pkt: &TxPacket) -> Result<TxJob> {
        if pkt.size() > MAX_PAYLOAD_SIZE {
            return Err(invalid(format!(
                "{} byte payload exceeds {MAX_PAYLOAD_SIZE} bytes",
                pkt.size()
            )));
        }

        self.check_rf_chain(pkt)?;
        let resolved = resolve_modulation(pkt)?;
        let trigger = self.resolve_trigger(&resolved)?;
        self.check_chain_free(resolved.rf_chain)?;

        let job = TxJob::new(resolved, trigger);
        log_tx_packet(&job.packet, job.airtime_us);
        if let Err(e) = self.transport.stage_transmit(&job) {
            error!("Failed to stage TX on RF chain {}: {e}", job.rf_chain());
            return Err(GatewayError::HardwareWriteError(e));
        }
        Ok(job)
    }

    fn check_rf_chain(&self, pkt: &TxPacket) -> Result<()> {
        let chain = usize::from(pkt.rf_chain);
        if chain >= RF_CHAIN_COUNT {
            return Err(invalid(format!("RF chain {chain} does not exist")));
        }
        let enabled = self
            .plan
            .as_ref()
            .is_some_and(|plan| plan.rf_enabled(chain));
        if !enabled {
            return Err(invalid(format!("RF chain {chain} is not enabled")));
        }

        let band = &self.topology.rf_tx_bands[chain];
        if !band.contains(pkt.freq_hz) {
            return Err(invalid(format!(
                "TX frequency {} Hz outside band {band} of RF chain {chain}",
                pkt.freq_hz
            )));
        }
        if !self.topology.tx_power_in_range(pkt.rf_power) {
            return Err(invalid(format!(
                "TX power {} dBm outside {}..={} dBm",
                pkt.rf_power, self.topology.tx_power_min_dbm, self.topology.tx_power_max_dbm
            )));
        }
        Ok(())
    }

    fn resolve_trigger(&mut self, pkt: &TxPacket) -> Result<TxTrigger> {
        match pkt.tx_mode {
            TxMode::Immediate => Ok(TxTrigger::Immediate),
            TxMode::Timestamped => {
                let now = self
                    .transport
                    .current_counter_us()
                    .map_err(GatewayError::HardwareReadError)?;
                if !counter_is_ahead(pkt.count_us, now) {
                    debug!(
                        "Rejected timestamped TX: target {} us, counter {now} us",
                        pkt.count_us
                    );
                    return Err(GatewayError::InvalidSchedule(format!(
                        "target {} us is not ahead of counter {now} us",
                        pkt.count_us
                    )));
                }
                Ok(TxTrigger::AtCounter(pkt.count_us))
            }
            mode @ (TxMode::OnEvent | TxMode::EventDelayed) => {
                self.require_trigger_input(mode)?;
                Ok(TxTrigger::OnEvent {
                    delay_us: delay_for(mode, pkt.count_us),
                })
            }
            mode @ (TxMode::OnGps | TxMode::GpsDelayed) => {
                let reference = self.time_source.current_gps_time().ok_or_else(|| {
                    debug!("Rejected {mode} TX: no GPS time available");
                    GatewayError::NoTimeSource
                })?;
                self.require_trigger_input(mode)?;
                Ok(TxTrigger::OnGps {
                    reference,
                    delay_us: delay_for(mode, pkt.count_us),
                })
            }
        }
    }

    fn require_trigger_input(&self, mode: TxMode) -> Result<()> {
        let present = if mode.is_gps_gated() {
            self.transport.supports_gps_trigger()
        } else if mode.is_event_gated() {
            self.transport.supports_event_trigger()
        } else {
            true
        };
        if !present {
            debug!("Rejected {mode} TX: board has no input for this trigger");
            return Err(GatewayError::UnsupportedMode(mode));
        }
        Ok(())
    }

    /// A chain is busy when the modem says so, or when a job staged on it
    /// has not been confirmed done by a `Free` or `Off` status.
    fn check_chain_free(&mut self, rf_chain: u8) -> Result<()> {
        let status = self
            .transport
            .tx_status(rf_chain)
            .map_err(GatewayError::HardwareReadError)?;
        if status.is_busy() {
            debug!("Rejected TX: RF chain {rf_chain} is {status}");
            return Err(GatewayError::ChainBusy(rf_chain));
        }
        if self.pending[usize::from(rf_chain)].is_some() && !status.is_idle() {
            debug!("Rejected TX: RF chain {rf_chain} reports {status} with a job outstanding");
            return Err(GatewayError::ChainBusy(rf_chain));
        }
        Ok(())
    }
}

fn delay_for(mode: TxMode, count_us: u32) -> u32 {
    if mode.is_delayed() {
        count_us
    } else {
        0
    }
}

fn invalid(reason: String) -> GatewayError {
    debug!("Rejected TX: {reason}");
    GatewayError::InvalidConfig(reason)
}

/// Check the modulation fields of `pkt` and return a copy with every default
/// resolved and every field the modulation does not use reset.
fn resolve_modulation(pkt: &TxPacket) -> Result<TxPacket> {
    let mut out = pkt.clone();

    if pkt.size() > MODEM_MAX_PAYLOAD_SIZE {
        return Err(invalid(format!(
            "{} byte payload exceeds the {MODEM_MAX_PAYLOAD_SIZE} byte modem limit",
            pkt.size()
        )));
    }

    match pkt.modulation {
        Modulation::Default | Modulation::Lora => {
            out.modulation = Modulation::Lora;
            if out.bandwidth == Bandwidth::Default {
                out.bandwidth = Bandwidth::Khz125;
            }
            out.datarate = match pkt.datarate {
                DataRate::Default => DataRate::Sf9,
                dr if dr.is_single_sf() => dr,
                dr => {
                    return Err(invalid(format!(
                        "LoRa TX needs a single spreading factor, got {dr}"
                    )))
                }
            };
            if out.coderate == CodeRate::Default {
                out.coderate = CodeRate::Cr4_5;
            }
            out.preamble = match pkt.preamble {
                0 => LORA_DEFAULT_PREAMBLE,
                p => p.max(LORA_MIN_PREAMBLE),
            };
            out.f_dev = 0;
        }
        Modulation::Fsk | Modulation::Gfsk => {
            if !(FSK_FDEV_MIN_KHZ..=FSK_FDEV_MAX_KHZ).contains(&pkt.f_dev) {
                return Err(invalid(format!(
                    "FSK deviation {} kHz outside {FSK_FDEV_MIN_KHZ}..={FSK_FDEV_MAX_KHZ} kHz",
                    pkt.f_dev
                )));
            }
            out.datarate = match pkt.datarate {
                DataRate::Default => DataRate::Fsk(FSK_DEFAULT_DATARATE),
                DataRate::Fsk(bps) if (FSK_DATARATE_MIN..=FSK_DATARATE_MAX).contains(&bps) => {
                    pkt.datarate
                }
                dr => {
                    return Err(invalid(format!(
                        "FSK TX needs a bitrate in {FSK_DATARATE_MIN}..={FSK_DATARATE_MAX} bps, got {dr}"
                    )))
                }
            };
            if out.preamble == 0 {
                out.preamble = FSK_DEFAULT_PREAMBLE;
            }
            out.bandwidth = Bandwidth::Default;
            out.coderate = CodeRate::Default;
            out.no_header = false;
        }
    }
    Ok(out)
}
