//! Blocking transfers through the EasyDMA engine.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{DmaTwi, Rig};
use twi_driver::hal::{TwimEvent, TwimTask};
use twi_driver::{TransferDescriptor, TwiError, TwiResult, XferFlags};
use twi_sim::{BusCondition, Device};

const ADDR: u8 = 0x20;

fn enabled(rig: &Rig<twi_sim::TwimSim>) -> DmaTwi<'static> {
    let twi = rig.twi();
    twi.initialize(None, None).unwrap();
    twi.enable().unwrap();
    twi
}

#[test]
fn write_puts_bytes_on_the_wire() {
    static DATA: [u8; 3] = [0x00, 0x10, 0xAB];
    let rig = Rig::dma(vec![Device::new(ADDR)]);
    let twi = enabled(&rig);

    twi.write(ADDR, &DATA, false).unwrap();

    assert!(!twi.is_busy());
    assert_eq!(rig.bus.device(ADDR).unwrap().written, DATA.to_vec());
    assert_eq!(
        rig.bus.log(),
        vec![
            BusCondition::Start,
            BusCondition::Address { address: ADDR, read: false },
            BusCondition::Ack,
            BusCondition::Data(0x00),
            BusCondition::Ack,
            BusCondition::Data(0x10),
            BusCondition::Ack,
            BusCondition::Data(0xAB),
            BusCondition::Ack,
            BusCondition::Stop,
        ]
    );
}

#[test]
fn read_fills_the_buffer() {
    let mut rx = [0u8; 3];
    let rig = Rig::dma(vec![Device::new(ADDR).with_read_data(&[9, 8, 7])]);
    let twi = enabled(&rig);

    twi.read(ADDR, &mut rx).unwrap();

    assert!(!twi.is_busy());
    assert_eq!(rx, [9, 8, 7]);
    let log = rig.bus.log();
    // Final byte is NACKed before STOP.
    assert_eq!(&log[log.len() - 3..], &[BusCondition::Read(7), BusCondition::Nack, BusCondition::Stop]);
}

#[test]
fn write_then_read_uses_repeated_start() {
    let command = [0x0F];
    let mut rx = [0u8; 2];
    let rig = Rig::dma(vec![Device::new(ADDR).with_read_data(&[0x42, 0x43])]);
    let twi = enabled(&rig);

    twi.transfer_blocking(TransferDescriptor::txrx(ADDR, &command, &mut rx), XferFlags::NONE)
        .unwrap();

    assert_eq!(rx, [0x42, 0x43]);
    assert_eq!(rig.bus.transactions(), 1);
    let log = rig.bus.log();
    assert!(log.contains(&BusCondition::RepeatedStart));
    assert!(log.contains(&BusCondition::Address { address: ADDR, read: true }));
    assert_eq!(log.iter().filter(|c| **c == BusCondition::Stop).count(), 1);
}

#[test]
fn buffer_is_free_between_reads() {
    let mut rx = [0u8; 2];
    let rig = Rig::dma(vec![Device::new(ADDR).with_read_data(&[0x31, 0x32])]);
    let twi = enabled(&rig);

    twi.read(ADDR, &mut rx).unwrap();
    assert_eq!(rx, [0x31, 0x32]);
    let first = rx[0];
    rx = [0; 2];

    twi.read(ADDR, &mut rx).unwrap();
    assert_eq!(rx, [0x31, 0x32]);
    assert_eq!(first, rx[0]);
    assert_eq!(rig.bus.transactions(), 2);
}

#[test]
fn stack_buffers_are_borrowed_per_call() {
    let rig = Rig::dma(vec![Device::new(ADDR).with_read_data(&[0x77])]);
    let twi = enabled(&rig);

    for register in 0..3u8 {
        let command = [register];
        let mut rx = [0u8; 1];
        twi.transfer_blocking(TransferDescriptor::txrx(ADDR, &command, &mut rx), XferFlags::NONE)
            .unwrap();
        assert_eq!(rx, [0x77]);
    }
    assert_eq!(rig.bus.device(ADDR).unwrap().written, vec![0, 1, 2]);
}

#[test]
fn no_stop_write_continues_in_one_transaction() {
    static HEAD: [u8; 1] = [0x01];
    static TAIL: [u8; 2] = [0x02, 0x03];
    let rig = Rig::dma(vec![Device::new(ADDR)]);
    let twi = enabled(&rig);

    twi.write(ADDR, &HEAD, true).unwrap();
    assert!(rig.bus.is_held());
    assert!(!twi.is_busy());

    twi.write(ADDR, &TAIL, false).unwrap();
    assert!(!rig.bus.is_held());
    assert_eq!(rig.bus.transactions(), 1);
    assert_eq!(
        rig.bus.log().iter().filter(|c| **c == BusCondition::Stop).count(),
        1
    );
    assert_eq!(rig.bus.device(ADDR).unwrap().written, vec![1, 2, 3]);
}

#[test]
fn address_nack_collapses_to_internal_error() {
    static DATA: [u8; 1] = [0x55];
    let rig = Rig::dma(vec![]);
    let twi = enabled(&rig);

    assert_eq!(twi.write(ADDR, &DATA, false), Err(TwiError::InternalError));
    assert!(!twi.is_busy());
    assert!(!rig.bus.is_held());
    assert_eq!(rig.bus.log().last(), Some(&BusCondition::Stop));

    // The instance stays usable.
    rig.bus.add_device(Device::new(ADDR));
    twi.write(ADDR, &DATA, false).unwrap();
}

#[test]
fn data_nack_collapses_to_internal_error() {
    static DATA: [u8; 3] = [1, 2, 3];
    let rig = Rig::dma(vec![Device::new(ADDR).nack_data_at(1)]);
    let twi = enabled(&rig);

    assert_eq!(twi.write(ADDR, &DATA, false), Err(TwiError::InternalError));
    assert_eq!(rig.bus.device(ADDR).unwrap().written, vec![1]);
    assert!(!rig.bus.is_held());
}

#[test]
fn handler_only_kinds_are_rejected() {
    static A: [u8; 1] = [1];
    static B: [u8; 1] = [2];
    let rig = Rig::dma(vec![Device::new(ADDR)]);
    let twi = enabled(&rig);

    assert_eq!(
        twi.transfer(TransferDescriptor::txtx(ADDR, &A, &B), XferFlags::NONE),
        Err(TwiError::NotSupported)
    );
    assert_eq!(
        twi.transfer(TransferDescriptor::tx(ADDR, &A), XferFlags::HOLD),
        Err(TwiError::NotSupported)
    );
    assert!(rig.bus.log().is_empty());
}

#[test]
fn byte_count_is_not_available() {
    let rig = Rig::dma(vec![]);
    let twi = enabled(&rig);
    assert_eq!(twi.bytes_transferred(), Err(TwiError::NotSupported));
}

#[test]
fn second_request_while_blocking_is_busy() {
    static FIRST: [u8; 2] = [1, 2];
    static SECOND: [u8; 1] = [3];
    let rig = Rig::dma(vec![Device::new(ADDR)]);
    let twi = Rc::new(enabled(&rig));

    // Submitted from the poll loop, the way a preempting context would.
    let outcome: Rc<Cell<Option<TwiResult<()>>>> = Rc::new(Cell::new(None));
    {
        let twi = Rc::clone(&twi);
        let outcome = Rc::clone(&outcome);
        rig.sim.set_poll_hook(move || {
            if outcome.get().is_none() {
                outcome.set(Some(twi.transfer(TransferDescriptor::tx(ADDR, &SECOND), XferFlags::NONE)));
            }
        });
    }

    assert_eq!(twi.write(ADDR, &FIRST, false), Ok(()));
    rig.sim.clear_poll_hook();

    assert_eq!(outcome.get(), Some(Err(TwiError::Busy)));
    assert_eq!(rig.bus.device(ADDR).unwrap().written, vec![1, 2]);
    assert!(!twi.is_busy());
}

#[test]
fn polling_waits_for_stopped() {
    static DATA: [u8; 1] = [1];
    let rig = Rig::dma(vec![Device::new(ADDR)]);
    let twi = enabled(&rig);

    twi.write(ADDR, &DATA, false).unwrap();

    assert!(rig.sim.is_set(TwimEvent::Stopped));
    assert!(rig.sim.tasks().contains(&TwimTask::StartTx));
    assert_eq!(rig.sim.inten(), 0);
}
