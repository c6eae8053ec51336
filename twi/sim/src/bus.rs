//! Simulated two-wire bus with scripted slave devices

use std::cell::RefCell;
use std::rc::Rc;

/// One electrical condition observed on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusCondition {
    Start,
    RepeatedStart,
    Address { address: u8, read: bool },
    Ack,
    Nack,
    /// Byte driven by the master.
    Data(u8),
    /// Byte driven by the slave.
    Read(u8),
    Stop,
}

/// Scripted slave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Device {
    pub address: u8,
    /// Bytes returned to reads, cycled.
    pub read_data: Vec<u8>,
    /// Every byte acknowledged so far.
    pub written: Vec<u8>,
    /// NACK the data byte written at this position of `written`.
    pub nack_data_at: Option<usize>,
    read_pos: usize,
}

impl Device {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            ..Self::default()
        }
    }

    pub fn with_read_data(mut self, data: &[u8]) -> Self {
        self.read_data = data.to_vec();
        self
    }

    pub fn nack_data_at(mut self, index: usize) -> Self {
        self.nack_data_at = Some(index);
        self
    }

    fn next_read(&mut self) -> u8 {
        if self.read_data.is_empty() {
            return 0xFF;
        }
        let byte = self.read_data[self.read_pos % self.read_data.len()];
        self.read_pos += 1;
        byte
    }
}

#[derive(Debug, Default)]
struct BusState {
    devices: Vec<Device>,
    log: Vec<BusCondition>,
    /// Address and direction of the transaction holding the bus.
    held: Option<(u8, bool)>,
    current: Option<usize>,
}

impl BusState {
    fn record(&mut self, condition: BusCondition) {
        log::trace!("bus: {:?}", condition);
        self.log.push(condition);
    }
}

/// Shared handle to a simulated bus.
#[derive(Debug, Clone, Default)]
pub struct SimBus {
    state: Rc<RefCell<BusState>>,
}

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, device: Device) {
        self.state.borrow_mut().devices.push(device);
    }

    pub fn device(&self, address: u8) -> Option<Device> {
        self.state
            .borrow()
            .devices
            .iter()
            .find(|device| device.address == address)
            .cloned()
    }

    /// Everything observed since the last [`SimBus::clear_log`].
    pub fn log(&self) -> Vec<BusCondition> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Number of START conditions (repeated STARTs excluded).
    pub fn transactions(&self) -> usize {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|condition| **condition == BusCondition::Start)
            .count()
    }

    pub fn is_held(&self) -> bool {
        self.state.borrow().held.is_some()
    }

    /// Addresses `address`; returns whether it was acknowledged.
    ///
    /// A held bus continuing in the same direction to the same address
    /// produces no condition at all.
    pub(crate) fn begin(&self, address: u8, read: bool) -> bool {
        let mut state = self.state.borrow_mut();
        if state.held == Some((address, read)) && state.current.is_some() {
            return true;
        }

        let start = if state.held.is_some() {
            BusCondition::RepeatedStart
        } else {
            BusCondition::Start
        };
        state.record(start);
        state.held = Some((address, read));
        state.record(BusCondition::Address { address, read });

        state.current = state.devices.iter().position(|device| device.address == address);
        let ack = state.current.is_some();
        state.record(if ack { BusCondition::Ack } else { BusCondition::Nack });
        ack
    }

    /// Master writes `byte`; returns whether it was acknowledged.
    pub(crate) fn write(&self, byte: u8) -> bool {
        let mut state = self.state.borrow_mut();
        state.record(BusCondition::Data(byte));

        let Some(index) = state.current else {
            state.record(BusCondition::Nack);
            return false;
        };
        let device = &mut state.devices[index];
        if device.nack_data_at == Some(device.written.len()) {
            state.record(BusCondition::Nack);
            return false;
        }
        device.written.push(byte);
        state.record(BusCondition::Ack);
        true
    }

    /// Master reads one byte and answers with ACK or NACK.
    pub(crate) fn read(&self, ack: bool) -> u8 {
        let mut state = self.state.borrow_mut();
        let byte = match state.current {
            Some(index) => state.devices[index].next_read(),
            None => 0xFF,
        };
        state.record(BusCondition::Read(byte));
        state.record(if ack { BusCondition::Ack } else { BusCondition::Nack });
        byte
    }

    pub(crate) fn stop(&self) {
        let mut state = self.state.borrow_mut();
        if state.held.take().is_some() {
            state.current = None;
            state.record(BusCondition::Stop);
        }
    }
}
