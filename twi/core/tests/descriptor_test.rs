//! Descriptor tests for twi-core

use twi_core::{TransferDescriptor, TransferKind, TwiError};

#[test]
fn test_constructors_set_kind() {
    let mut rx = [0u8; 2];
    assert_eq!(TransferDescriptor::tx(0x10, &[1]).kind(), TransferKind::Tx);
    assert_eq!(TransferDescriptor::txtx(0x10, &[1], &[2]).kind(), TransferKind::TxTx);
    assert_eq!(TransferDescriptor::txrx(0x10, &[1], &mut rx).kind(), TransferKind::TxRx);
    assert_eq!(TransferDescriptor::rx(0x10, &mut rx).kind(), TransferKind::Rx);
}

#[test]
fn test_valid_descriptors() {
    let mut rx = [0u8; 3];
    assert!(TransferDescriptor::tx(0x10, &[1, 2]).validate().is_ok());
    assert!(TransferDescriptor::txtx(0x10, &[1], &[2, 3]).validate().is_ok());
    assert!(TransferDescriptor::rx(0x10, &mut rx).validate().is_ok());
}

#[test]
fn test_oversized_buffer_rejected() {
    let big = vec![0u8; usize::from(u16::MAX) + 1];
    let desc = TransferDescriptor::tx(0x10, &big);
    assert_eq!(desc.validate(), Err(TwiError::InvalidParameter));
}

#[test]
fn test_lengths() {
    let mut rx = [0u8; 5];
    let desc = TransferDescriptor::txrx(0x10, &[1, 2], &mut rx);
    assert_eq!(desc.primary_len(), 2);
    assert_eq!(desc.secondary_len(), 5);
    assert_eq!(desc.address(), 0x10);
}
