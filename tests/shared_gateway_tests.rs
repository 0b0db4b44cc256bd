//! Integration tests for the thread-safe gateway handle.

mod common;

use common::*;
use loragw_hal::{GatewayError, GatewayState, RfChainConfig, SharedGateway};
use std::sync::Arc;
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

/// Tests that the handle can cross threads.
#[test]
fn test_shared_gateway_is_send_sync() {
    assert_send_sync::<SharedGateway<loragw_hal::hal::mock::MockTransport>>();
}

/// Tests that a receiver thread and a sender thread share one gateway.
#[test]
fn test_concurrent_receive_and_send() {
    let (gw, mock) = running_gateway();
    let shared = SharedGateway::new(gw);
    mock.push_rx_many((0..40).map(|i| rx_packet(0, i)));

    let rx = {
        let shared = shared.clone();
        thread::spawn(move || {
            let mut received = Vec::new();
            while received.len() < 40 {
                received.extend(shared.receive(8).unwrap());
            }
            received
        })
    };
    let tx = {
        let shared = shared.clone();
        let mock = mock.clone();
        thread::spawn(move || {
            for _ in 0..20 {
                shared.send(&lora_tx(1)).unwrap();
                mock.complete_transmissions();
            }
        })
    };

    let received = rx.join().unwrap();
    tx.join().unwrap();

    let order: Vec<u8> = received.iter().map(|p| p.payload[0]).collect();
    assert_eq!(order, (0..40).collect::<Vec<u8>>());
    assert_eq!(shared.stats().tx_staged, 20);
    assert_eq!(mock.staged_jobs().len(), 20);
}

/// Tests that the lifecycle is shared by every clone.
#[test]
fn test_lifecycle_through_clones() {
    let (mut gw, _mock) = idle_gateway();
    configure_reference_plan(&mut gw);
    let a = SharedGateway::from(gw);
    let b = a.clone();

    a.start().unwrap();
    assert_eq!(b.state(), GatewayState::Running);
    assert_eq!(b.start(), Err(GatewayError::AlreadyRunning));
    assert_eq!(
        b.set_rf_chain_config(0, RfChainConfig::enabled(RF0_FREQ)),
        Err(GatewayError::InvalidState(GatewayState::Running))
    );
    b.stop().unwrap();
    assert_eq!(a.state(), GatewayState::Idle);
}

/// Tests that a panic while holding the lock does not wedge the gateway.
#[test]
fn test_poisoned_lock_recovered() {
    let (gw, _mock) = running_gateway();
    let shared = Arc::new(SharedGateway::new(gw));

    let poisoner = Arc::clone(&shared);
    let result = thread::spawn(move || {
        let _guard = poisoner.lock();
        panic!("worker died");
    })
    .join();
    assert!(result.is_err());

    assert_eq!(shared.state(), GatewayState::Running);
    assert!(shared.receive(8).unwrap().is_empty());
    shared.stop().unwrap();
}
