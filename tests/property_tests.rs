//! Property tests for chain indexing, receive bounds and counter arithmetic.

mod common;

use common::*;
use loragw_hal::{counter_is_ahead, GatewayError, IfChainConfig, RfChainConfig, TxMode, TxPacket};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_rf_index_out_of_range(index in 2u8..=u8::MAX, freq in any::<u32>()) {
        let (mut gw, _mock) = idle_gateway();
        let err = gw.set_rf_chain_config(index, RfChainConfig::enabled(freq)).unwrap_err();
        prop_assert_eq!(err, GatewayError::InvalidIndex { index: usize::from(index), count: 2 });
        prop_assert_eq!(gw.rf_chain_config(0).unwrap(), RfChainConfig::default());
        prop_assert_eq!(gw.rf_chain_config(1).unwrap(), RfChainConfig::default());
    }

    #[test]
    fn prop_if_index_out_of_range(index in 10u8..=u8::MAX, offset in any::<i32>()) {
        let (mut gw, _mock) = idle_gateway();
        let err = gw.set_if_chain_config(index, IfChainConfig::enabled(0, offset)).unwrap_err();
        prop_assert_eq!(err, GatewayError::InvalidIndex { index: usize::from(index), count: 10 });
        for i in 0..10 {
            prop_assert_eq!(gw.if_chain_config(i).unwrap(), IfChainConfig::default());
        }
    }

    #[test]
    fn prop_receive_bounded_and_ordered(queued in 0usize..40, batch in 0usize..20) {
        let (mut gw, mock) = running_gateway();
        mock.push_rx_many((0..queued).map(|i| rx_packet(0, i as u8)));

        let mut next = 0usize;
        loop {
            let before = mock.fifo_len();
            let got = gw.receive(batch).unwrap();
            prop_assert!(got.len() <= batch.min(8));
            prop_assert_eq!(mock.fifo_len(), before - got.len());
            for pkt in &got {
                prop_assert_eq!(pkt.payload[0], next as u8);
                next += 1;
            }
            if got.is_empty() {
                break;
            }
        }
        let expected = if batch == 0 { 0 } else { queued };
        prop_assert_eq!(next, expected);
    }

    #[test]
    fn prop_counter_ahead_matches_half_range(now in any::<u32>(), delta in any::<u32>()) {
        let target = now.wrapping_add(delta);
        prop_assert_eq!(counter_is_ahead(target, now), delta != 0 && delta < (1u32 << 31));
    }

    #[test]
    fn prop_timestamped_send_follows_counter(now in any::<u32>(), delta in any::<u32>()) {
        let (mut gw, mock) = running_gateway();
        mock.set_counter(now);
        let pkt = TxPacket {
            tx_mode: TxMode::Timestamped,
            count_us: now.wrapping_add(delta),
            ..lora_tx(0)
        };
        let result = gw.send(&pkt);
        if delta != 0 && delta < (1u32 << 31) {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(GatewayError::InvalidSchedule(_))));
        }
    }
}
