//! Receive Drain Engine
//!
//! Non-blocking drain of the concentrator's packet FIFO. Each call pops at
//! most [`PKT_FIFO_SIZE`] packets in arrival order and checks that the
//! transport kept its side of the contract before handing them out. Valid
//! packets from a rejected batch wait in the gateway's backlog.

use super::Gateway;
use crate::constants::{IF_CHAIN_COUNT, MAX_PAYLOAD_SIZE, PKT_FIFO_SIZE};
use crate::error::{GatewayError, Result};
use crate::hal::{RadioTransport, TransportError};
use crate::logging::log_rx_packet;
use crate::radio::RxPacket;
use log::{error, trace, warn};

impl<T: RadioTransport> Gateway<T> {
    /// Drain up to `max_packets` received packets
    ///
    /// `max_packets` is capped at the FIFO capacity. An empty vector means no
    /// packet was waiting; asking for zero packets never reaches the hardware.
    ///
    /// When the transport hands back a batch that breaks its contract, the
    /// offending records are discarded and the valid ones are held back. They
    /// are returned, in order, by the following calls before the FIFO is read
    /// again.
    ///
    /// # Returns
    /// * `NotRunning` while idle
    /// * `HardwareReadError` when the transport fails, reports a FIFO
    ///   overflow (`TransportError::Overflow`) or returns malformed records
    pub fn receive(&mut self, max_packets: usize) -> Result<Vec<RxPacket>> {
        self.ensure_running()?;

        let max = max_packets.min(PKT_FIFO_SIZE);
        if max == 0 {
            return Ok(Vec::new());
        }

        if !self.rx_backlog.is_empty() {
            let take = max.min(self.rx_backlog.len());
            let packets: Vec<RxPacket> = self.rx_backlog.drain(..take).collect();
            trace!(
                "Delivered {} held packet(s), {} still held",
                packets.len(),
                self.rx_backlog.len()
            );
            return Ok(self.deliver(packets));
        }

        let batch = match self.transport.read_available_packets(max) {
            Ok(batch) => batch,
            Err(e) => {
                self.stats.rx_read_errors += 1;
                match &e {
                    TransportError::Overflow { dropped } => {
                        warn!("Receive FIFO overflow, {dropped} packet(s) lost");
                        self.stats.record_overflow(*dropped);
                    }
                    other => error!("Failed to read receive FIFO: {other}"),
                }
                return Err(GatewayError::HardwareReadError(e));
            }
        };

        let mut violation = None;
        if batch.len() > max {
            violation = Some(TransportError::Malformed(format!(
                "{} packets returned, at most {max} requested",
                batch.len()
            )));
        }
        let mut valid = Vec::with_capacity(batch.len());
        for pkt in batch {
            match check_record(&pkt) {
                Ok(()) => valid.push(pkt),
                Err(e) => {
                    self.stats.rx_malformed += 1;
                    violation.get_or_insert(e);
                }
            }
        }

        if let Some(e) = violation {
            self.stats.rx_read_errors += 1;
            error!(
                "Transport broke the receive contract: {e}; holding {} valid packet(s)",
                valid.len()
            );
            self.rx_backlog.extend(valid);
            return Err(GatewayError::HardwareReadError(e));
        }

        trace!("Drained {} packet(s) (max {max})", valid.len());
        Ok(self.deliver(valid))
    }

    fn deliver(&mut self, packets: Vec<RxPacket>) -> Vec<RxPacket> {
        for pkt in &packets {
            self.stats.record_rx(pkt);
            log_rx_packet(pkt);
        }
        packets
    }
}

fn check_record(pkt: &RxPacket) -> std::result::Result<(), TransportError> {
    if usize::from(pkt.if_chain) >= IF_CHAIN_COUNT {
        return Err(TransportError::Malformed(format!(
            "packet on nonexistent IF chain {}",
            pkt.if_chain
        )));
    }
    if pkt.size() > MAX_PAYLOAD_SIZE {
        return Err(TransportError::Malformed(format!(
            "{} byte payload exceeds {MAX_PAYLOAD_SIZE} bytes",
            pkt.size()
        )));
    }
    Ok(())
}
