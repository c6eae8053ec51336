//! Driver state machine, configuration and argument checks.

mod common;

use common::{Recorder, Rig, SCL_PIN, SDA_PIN};
use twi_driver::hal::twim::{int, shorts};
use twi_driver::hal::interrupt::NoInterrupt;
use twi_driver::hal::{PinMode, RamRegion, TwimEvent, TwimTask};
use twi_driver::{DmaEngine, DriverState, Frequency, TransferDescriptor, Twi, TwiConfig, TwiError, XferFlags};
use twi_sim::{sim_lines, Device, SimBus, SimDelay, TwimSim, Wire, TWIM0_BASE};

#[test]
fn state_transitions() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    assert_eq!(twi.state(), DriverState::Uninitialized);

    assert_eq!(twi.enable(), Err(TwiError::InvalidState));
    assert_eq!(twi.uninitialize(), Err(TwiError::InvalidState));

    twi.initialize(None, None).unwrap();
    assert_eq!(twi.state(), DriverState::Initialized);
    assert_eq!(twi.initialize(None, None), Err(TwiError::InvalidState));
    assert_eq!(twi.disable(), Err(TwiError::InvalidState));

    twi.enable().unwrap();
    assert_eq!(twi.state(), DriverState::Enabled);
    assert!(rig.sim.is_enabled());
    assert_eq!(twi.enable(), Err(TwiError::InvalidState));

    twi.disable().unwrap();
    assert_eq!(twi.state(), DriverState::Initialized);
    assert!(!rig.sim.is_enabled());

    twi.enable().unwrap();
    twi.uninitialize().unwrap();
    assert_eq!(twi.state(), DriverState::Uninitialized);
    assert!(!rig.sim.is_enabled());

    // Re-initialisable after teardown.
    twi.initialize(None, None).unwrap();
}

#[test]
fn configuration_reaches_the_peripheral() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    let config = TwiConfig::builder().frequency(Frequency::K400).build();

    twi.initialize(Some(config), None).unwrap();

    assert_eq!(rig.sim.pins(), Some((SCL_PIN, SDA_PIN)));
    assert_eq!(rig.sim.frequency(), Frequency::K400.register_value());
}

#[test]
fn default_frequency_is_100k() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    twi.initialize(None, None).unwrap();
    assert_eq!(rig.sim.frequency(), 0x0198_0000);
}

#[test]
fn interrupt_line_follows_handler_registration() {
    let recorder = Recorder::default();
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    let config = TwiConfig::builder().interrupt_priority(3).build();

    twi.initialize(Some(config), Some(&recorder)).unwrap();
    assert!(rig.irq.is_enabled());
    assert_eq!(rig.irq.priority(), Some(3));

    twi.uninitialize().unwrap();
    assert!(!rig.irq.is_enabled());
    assert_eq!(rig.irq.disables(), 1);
}

#[test]
fn blocking_instance_leaves_interrupt_line_alone() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();

    twi.initialize(None, None).unwrap();
    twi.uninitialize().unwrap();

    assert_eq!(rig.irq.enables(), 0);
    assert_eq!(rig.irq.disables(), 0);
}

#[test]
fn uninitialize_releases_pins() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    twi.initialize(None, None).unwrap();
    twi.uninitialize().unwrap();

    assert_eq!(rig.lines.mode(Wire::Scl), Some(PinMode::Disconnected));
    assert_eq!(rig.lines.mode(Wire::Sda), Some(PinMode::Disconnected));
}

#[test]
fn uninitialize_can_hold_pins() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();
    let config = TwiConfig::builder().hold_bus_uninit(true).build();
    twi.initialize(Some(config), None).unwrap();
    twi.uninitialize().unwrap();

    assert_eq!(rig.lines.mode(Wire::Scl), Some(PinMode::InputPullUp));
    assert_eq!(rig.lines.mode(Wire::Sda), Some(PinMode::InputPullUp));
}

#[test]
fn disable_clears_interrupts_and_shortcuts() {
    let recorder = Recorder::default();
    let data = [1, 2];
    let rig = Rig::dma(vec![Device::new(0x20)]);
    let twi = rig.twi();
    twi.initialize(None, Some(&recorder)).unwrap();
    twi.enable().unwrap();

    twi.transfer(TransferDescriptor::tx(0x20, &data), XferFlags::NONE)
        .unwrap();
    assert!(twi.is_busy());
    assert_ne!(rig.sim.inten(), 0);

    twi.disable().unwrap();
    assert!(!twi.is_busy());
    assert_eq!(rig.sim.inten() & int::ALL, 0);
    assert_eq!(rig.sim.shorts() & shorts::ALL, 0);
}

#[test]
fn transfer_requires_enabled_instance() {
    let data = [1];
    let rig = Rig::dma(vec![Device::new(0x20)]);
    let twi = rig.twi();

    assert_eq!(twi.write(0x20, &data, false), Err(TwiError::InvalidState));
    twi.initialize(None, None).unwrap();
    assert_eq!(twi.write(0x20, &data, false), Err(TwiError::InvalidState));
    assert!(rig.bus.log().is_empty());
}

#[test]
fn malformed_requests_are_rejected() {
    let data = [1];
    let empty: [u8; 0] = [];
    let mut rx = [0u8; 1];
    let rig = Rig::dma(vec![Device::new(0x20)]);
    let twi = rig.twi();
    twi.initialize(None, None).unwrap();
    twi.enable().unwrap();

    assert_eq!(twi.write(0x20, &empty, false), Err(TwiError::InvalidParameter));
    assert_eq!(
        twi.transfer(TransferDescriptor::tx(0x20, &data), XferFlags::TX_POSTINC),
        Err(TwiError::NotSupported)
    );
    assert_eq!(
        twi.transfer(TransferDescriptor::rx(0x20, &mut rx), XferFlags::NO_STOP),
        Err(TwiError::NotSupported)
    );
    assert!(rig.bus.log().is_empty());
    assert!(!twi.is_busy());
}

#[test]
fn buffers_outside_dma_window_are_rejected() {
    let data = [1, 2];
    let rig = Rig::dma(vec![Device::new(0x20)]);
    let twi = rig.twi_in(RamRegion { start: 0, end: 1 });
    twi.initialize(None, None).unwrap();
    twi.enable().unwrap();

    assert_eq!(twi.write(0x20, &data, false), Err(TwiError::InvalidAddress));
    assert!(rig.bus.log().is_empty());
}

#[test]
fn register_addresses() {
    let rig = Rig::dma(vec![]);
    let twi = rig.twi();

    assert_eq!(twi.task_address(TwimTask::StartTx), TWIM0_BASE + 0x008);
    assert_eq!(twi.task_address(TwimTask::Stop), TWIM0_BASE + 0x014);
    assert_eq!(twi.event_address(TwimEvent::Stopped), TWIM0_BASE + 0x104);
    assert_eq!(twi.event_address(TwimEvent::Error), TWIM0_BASE + 0x124);
}

#[test]
fn blocking_instance_needs_no_interrupt_line() {
    let data = [0x42];
    let bus = SimBus::new();
    bus.add_device(Device::new(0x20));
    let (scl, sda, _lines) = sim_lines(SCL_PIN, SDA_PIN, 0);
    let twi = Twi::new(
        DmaEngine::new(TwimSim::new(bus.clone()), RamRegion::unrestricted()),
        scl,
        sda,
        SimDelay::new(),
        NoInterrupt,
    );
    twi.initialize(None, None).unwrap();
    twi.enable().unwrap();

    twi.write(0x20, &data, false).unwrap();
    assert_eq!(bus.device(0x20).unwrap().written, vec![0x42]);
    twi.uninitialize().unwrap();
}
