//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use loragw_hal::hal::mock::MockTransport;
use loragw_hal::{
    Bandwidth, CrcStatus, DataRate, Gateway, IfChainConfig, Modulation, RfChainConfig, RxPacket,
    TxPacket,
};

pub const RF0_FREQ: u32 = 867_500_000;
pub const RF1_FREQ: u32 = 868_500_000;
pub const TX_FREQ: u32 = 868_100_000;

/// Idle gateway on the reference board, plus a handle on its mock
pub fn idle_gateway() -> (Gateway<MockTransport>, MockTransport) {
    let mock = MockTransport::new();
    (Gateway::new(mock.clone()), mock)
}

/// Both radios and every usable IF chain of the reference board
pub fn configure_reference_plan(gw: &mut Gateway<MockTransport>) {
    gw.set_rf_chain_config(0, RfChainConfig::enabled(RF0_FREQ))
        .unwrap();
    gw.set_rf_chain_config(1, RfChainConfig::enabled(RF1_FREQ))
        .unwrap();

    for (i, offset) in [-300_000, -100_000, 100_000, 300_000].into_iter().enumerate() {
        gw.set_if_chain_config(i as u8, IfChainConfig::enabled(0, offset))
            .unwrap();
    }
    gw.set_if_chain_config(
        8,
        IfChainConfig::enabled(1, -200_000).with_datarate(DataRate::Sf7),
    )
    .unwrap();
    gw.set_if_chain_config(
        9,
        IfChainConfig::enabled(1, 200_000)
            .with_bandwidth(Bandwidth::Khz125)
            .with_datarate(DataRate::Fsk(50_000)),
    )
    .unwrap();
}

/// Running gateway with the reference plan
pub fn running_gateway() -> (Gateway<MockTransport>, MockTransport) {
    let (mut gw, mock) = idle_gateway();
    configure_reference_plan(&mut gw);
    gw.start().unwrap();
    (gw, mock)
}

/// LoRa packet on IF chain `if_chain` whose payload is `[tag]`
pub fn rx_packet(if_chain: u8, tag: u8) -> RxPacket {
    RxPacket {
        if_chain,
        status: CrcStatus::Ok,
        modulation: Modulation::Lora,
        datarate: DataRate::Sf7,
        count_us: u32::from(tag) * 1_000,
        rssi: -80,
        snr: 28,
        payload: Bytes::from(vec![tag]),
        ..Default::default()
    }
}

/// Valid immediate LoRa packet on `rf_chain`
pub fn lora_tx(rf_chain: u8) -> TxPacket {
    TxPacket {
        freq_hz: TX_FREQ,
        rf_chain,
        rf_power: 14,
        modulation: Modulation::Lora,
        payload: Bytes::from_static(&[0x42]),
        ..Default::default()
    }
}
