//! Behavioural model of the legacy byte-wise `TWI` peripheral
//!
//! STARTTX addresses the slave; every TXD write clocks one byte out.
//! STARTRX and RESUME clock one byte in; the byte-boundary shortcuts decide
//! whether the peripheral then suspends (ACK) or stops (NACK + STOP).

use std::cell::RefCell;
use std::rc::Rc;

use twi_hal::errorsrc;
use twi_hal::twi::shorts;
use twi_hal::{TwiEvent, TwiRegisters, TwiTask};

use crate::bus::SimBus;

/// Default peripheral base address (TWI0).
pub const TWI0_BASE: u32 = 0x4000_3000;

struct TwiState {
    bus: SimBus,
    base: u32,
    enabled: bool,
    pins: Option<(u32, u32)>,
    frequency: u32,
    address: u8,
    events: u32,
    shorts: u32,
    inten: u32,
    errorsrc: u32,
    rxd: u8,
    tx_active: bool,
    rx_active: bool,
    suspended: bool,
    tasks: Vec<TwiTask>,
}

impl TwiState {
    fn set(&mut self, event: TwiEvent) {
        self.events |= event.int_mask();
    }

    fn error(&mut self, source: u32) {
        self.errorsrc |= source;
        self.set(TwiEvent::Error);
    }

    fn receive_next(&mut self) {
        let stop_after = self.shorts & shorts::BB_STOP != 0;
        self.rxd = self.bus.read(!stop_after);
        self.set(TwiEvent::RxdReady);
        self.set(TwiEvent::ByteBoundary);
        if stop_after {
            self.stop();
        } else {
            self.suspended = true;
        }
    }

    fn stop(&mut self) {
        self.bus.stop();
        self.tx_active = false;
        self.rx_active = false;
        self.suspended = false;
        self.set(TwiEvent::Stopped);
    }
}

/// Shared handle to a simulated legacy TWI instance.
#[derive(Clone)]
pub struct TwiSim {
    state: Rc<RefCell<TwiState>>,
}

impl TwiSim {
    pub fn new(bus: SimBus) -> Self {
        Self {
            state: Rc::new(RefCell::new(TwiState {
                bus,
                base: TWI0_BASE,
                enabled: false,
                pins: None,
                frequency: 0,
                address: 0,
                events: 0,
                shorts: 0,
                inten: 0,
                errorsrc: 0,
                rxd: 0,
                tx_active: false,
                rx_active: false,
                suspended: false,
                tasks: Vec::new(),
            })),
        }
    }

    /// An enabled event is latched.
    pub fn irq_pending(&self) -> bool {
        let state = self.state.borrow();
        state.events & state.inten != 0
    }

    pub fn is_set(&self, event: TwiEvent) -> bool {
        self.state.borrow().events & event.int_mask() != 0
    }

    pub fn shorts(&self) -> u32 {
        self.state.borrow().shorts
    }

    pub fn inten(&self) -> u32 {
        self.state.borrow().inten
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn tasks(&self) -> Vec<TwiTask> {
        self.state.borrow().tasks.clone()
    }
}

impl TwiRegisters for TwiSim {
    fn base_address(&self) -> u32 {
        self.state.borrow().base
    }

    fn enable(&self) {
        self.state.borrow_mut().enabled = true;
    }

    fn disable(&self) {
        self.state.borrow_mut().enabled = false;
    }

    fn set_pins(&self, scl: u32, sda: u32) {
        self.state.borrow_mut().pins = Some((scl, sda));
    }

    fn set_frequency(&self, frequency: u32) {
        self.state.borrow_mut().frequency = frequency;
    }

    fn set_address(&self, address: u8) {
        self.state.borrow_mut().address = address;
    }

    fn txd_set(&self, byte: u8) {
        let mut state = self.state.borrow_mut();
        if !state.tx_active {
            return;
        }
        if state.bus.write(byte) {
            state.set(TwiEvent::TxdSent);
            state.set(TwiEvent::ByteBoundary);
        } else {
            state.tx_active = false;
            state.error(errorsrc::DNACK);
        }
    }

    fn rxd_get(&self) -> u8 {
        self.state.borrow().rxd
    }

    fn trigger(&self, task: TwiTask) {
        let mut state = self.state.borrow_mut();
        state.tasks.push(task);
        match task {
            TwiTask::StartTx => {
                state.suspended = false;
                state.rx_active = false;
                let address = state.address;
                state.tx_active = state.bus.begin(address, false);
                if !state.tx_active {
                    state.error(errorsrc::ANACK);
                }
            }
            TwiTask::StartRx => {
                state.suspended = false;
                state.tx_active = false;
                let address = state.address;
                if state.bus.begin(address, true) {
                    state.rx_active = true;
                    state.receive_next();
                } else {
                    state.error(errorsrc::ANACK);
                }
            }
            TwiTask::Resume => {
                if state.suspended {
                    state.suspended = false;
                    if state.rx_active {
                        state.receive_next();
                    }
                }
            }
            TwiTask::Suspend => {
                state.suspended = true;
                state.set(TwiEvent::Suspended);
            }
            TwiTask::Stop => state.stop(),
        }
    }

    fn event_check(&self, event: TwiEvent) -> bool {
        self.is_set(event)
    }

    fn event_clear(&self, event: TwiEvent) {
        self.state.borrow_mut().events &= !event.int_mask();
    }

    fn shorts_set(&self, mask: u32) {
        self.state.borrow_mut().shorts = mask;
    }

    fn int_enable(&self, mask: u32) {
        self.state.borrow_mut().inten |= mask;
    }

    fn int_disable(&self, mask: u32) {
        self.state.borrow_mut().inten &= !mask;
    }

    fn errorsrc_get_and_clear(&self) -> u32 {
        std::mem::take(&mut self.state.borrow_mut().errorsrc)
    }
}
