//! Shared rigs for the driver integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use twi_driver::hal::RamRegion;
use twi_driver::{ByteEngine, DmaEngine, EventHandler, EventKind, TransferEvent, TransferKind, Twi};
use twi_sim::{sim_lines, Device, LineProbe, SimBus, SimDelay, SimIrq, SimPin, TwiSim, TwimSim};

pub const SCL_PIN: u32 = 27;
pub const SDA_PIN: u32 = 26;

pub type DmaTwi<'d> = Twi<'d, DmaEngine<TwimSim, RamRegion>, SimPin, SimDelay, SimIrq>;
pub type ByteTwi<'d> = Twi<'d, ByteEngine<TwiSim>, SimPin, SimDelay, SimIrq>;

/// Owned copy of a delivered event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub kind: EventKind,
    pub transfer: TransferKind,
    pub address: u8,
    pub primary: Vec<u8>,
    pub secondary: Vec<u8>,
}

/// Handler that keeps every event it is given.
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<Recorded>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events().iter().map(|event| event.kind).collect()
    }
}

impl EventHandler for Recorder {
    fn on_event(&self, event: &TransferEvent<'_>) {
        self.events.lock().unwrap().push(Recorded {
            kind: event.kind,
            transfer: event.descriptor.kind,
            address: event.descriptor.address,
            primary: event.descriptor.primary.to_vec(),
            secondary: event.descriptor.secondary.to_vec(),
        });
    }
}

/// Simulated bus, lines and interrupt line around one peripheral model.
pub struct Rig<S> {
    pub bus: SimBus,
    pub sim: S,
    pub lines: LineProbe,
    pub irq: SimIrq,
    pub delay: SimDelay,
    scl: SimPin,
    sda: SimPin,
}

fn parts(devices: Vec<Device>, stuck_for: u32) -> (SimBus, SimPin, SimPin, LineProbe) {
    let bus = SimBus::new();
    for device in devices {
        bus.add_device(device);
    }
    let (scl, sda, lines) = sim_lines(SCL_PIN, SDA_PIN, stuck_for);
    (bus, scl, sda, lines)
}

impl Rig<TwimSim> {
    pub fn dma(devices: Vec<Device>) -> Self {
        Self::dma_stuck(devices, 0)
    }

    pub fn dma_stuck(devices: Vec<Device>, stuck_for: u32) -> Self {
        let (bus, scl, sda, lines) = parts(devices, stuck_for);
        Self {
            sim: TwimSim::new(bus.clone()),
            bus,
            lines,
            irq: SimIrq::new(),
            delay: SimDelay::new(),
            scl,
            sda,
        }
    }

    pub fn twi<'d>(&self) -> DmaTwi<'d> {
        self.twi_in(RamRegion::unrestricted())
    }

    pub fn twi_in<'d>(&self, region: RamRegion) -> DmaTwi<'d> {
        Twi::new(
            DmaEngine::new(self.sim.clone(), region),
            self.scl.clone(),
            self.sda.clone(),
            self.delay.clone(),
            self.irq.clone(),
        )
    }

    /// Services the interrupt until no enabled event is pending.
    pub fn pump(&self, twi: &DmaTwi<'_>) {
        for _ in 0..64 {
            if !self.sim.irq_pending() {
                return;
            }
            twi.on_interrupt();
        }
        panic!("interrupt never settled");
    }
}

impl Rig<TwiSim> {
    pub fn byte(devices: Vec<Device>) -> Self {
        let (bus, scl, sda, lines) = parts(devices, 0);
        Self {
            sim: TwiSim::new(bus.clone()),
            bus,
            lines,
            irq: SimIrq::new(),
            delay: SimDelay::new(),
            scl,
            sda,
        }
    }

    pub fn twi<'d>(&self) -> ByteTwi<'d> {
        Twi::new(
            ByteEngine::new(self.sim.clone()),
            self.scl.clone(),
            self.sda.clone(),
            self.delay.clone(),
            self.irq.clone(),
        )
    }

    pub fn pump(&self, twi: &ByteTwi<'_>) {
        for _ in 0..256 {
            if !self.sim.irq_pending() {
                return;
            }
            twi.on_interrupt();
        }
        panic!("interrupt never settled");
    }
}
