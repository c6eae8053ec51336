//! Behavioural model of the EasyDMA `TWIM` peripheral
//!
//! Tasks execute eagerly: triggering a start task runs the whole leg on the
//! simulated bus, latches the resulting events and follows the configured
//! shortcuts before returning. Start tasks triggered while suspended are
//! held until RESUME. On a slow bus a start task only raises its STARTED
//! event; the leg runs on [`TwimSim::finish_leg`].

use std::cell::RefCell;
use std::rc::Rc;

use twi_hal::errorsrc;
use twi_hal::twim::shorts;
use twi_hal::{TwimEvent, TwimRegisters, TwimTask};

use crate::bus::SimBus;

/// Default peripheral base address (TWIM0).
pub const TWIM0_BASE: u32 = 0x4000_3000;

type PollHook = Box<dyn FnMut()>;

struct TwimState {
    bus: SimBus,
    base: u32,
    enabled: bool,
    pins: Option<(u32, u32)>,
    frequency: u32,
    address: u8,
    tx: (*const u8, usize),
    rx: (*mut u8, usize),
    events: u32,
    shorts: u32,
    inten: u32,
    errorsrc: u32,
    txd_amount: u16,
    rxd_amount: u16,
    suspended: bool,
    latched: Option<TwimTask>,
    tasks: Vec<TwimTask>,
    stall_txstarted: bool,
    slow: bool,
    in_flight: Option<(TwimTask, (*const u8, usize))>,
    poll_hook: Option<PollHook>,
}

impl TwimState {
    fn set(&mut self, event: TwimEvent) {
        self.events |= event.int_mask();
    }

    fn error(&mut self, source: u32) {
        self.errorsrc |= source;
        self.set(TwimEvent::Error);
    }

    fn run(&mut self, task: TwimTask) {
        match task {
            TwimTask::StartTx => self.run_tx(),
            TwimTask::StartRx => self.run_rx(),
            _ => {}
        }
    }

    fn run_tx(&mut self) {
        if !self.stall_txstarted {
            self.set(TwimEvent::TxStarted);
        }
        self.txd_amount = 0;
        if !self.bus.begin(self.address, false) {
            self.error(errorsrc::ANACK);
            return;
        }

        let (ptr, len) = self.tx;
        let data: Vec<u8> = if ptr.is_null() {
            Vec::new()
        } else {
            // SAFETY: the driver keeps the descriptor owning this buffer
            // alive and untouched until the transfer completes.
            unsafe { std::slice::from_raw_parts(ptr, len) }.to_vec()
        };
        for byte in data {
            if !self.bus.write(byte) {
                self.error(errorsrc::DNACK);
                return;
            }
            self.txd_amount += 1;
        }

        self.set(TwimEvent::LastTx);
        if self.shorts & shorts::LASTTX_STARTRX != 0 {
            self.run_rx();
        } else if self.shorts & shorts::LASTTX_SUSPEND != 0 {
            self.suspend();
        } else if self.shorts & shorts::LASTTX_STOP != 0 {
            self.stop();
        }
    }

    fn run_rx(&mut self) {
        self.set(TwimEvent::RxStarted);
        self.rxd_amount = 0;
        if !self.bus.begin(self.address, true) {
            self.error(errorsrc::ANACK);
            return;
        }

        let (ptr, len) = self.rx;
        let nack_last = self.shorts & shorts::LASTRX_STOP != 0;
        for index in 0..len {
            let last = index + 1 == len;
            let byte = self.bus.read(!(last && nack_last));
            // SAFETY: as for the transmit buffer; `index < len`.
            unsafe { ptr.add(index).write(byte) };
            self.rxd_amount += 1;
        }

        self.set(TwimEvent::LastRx);
        if self.shorts & shorts::LASTRX_STOP != 0 {
            self.stop();
        } else if self.shorts & shorts::LASTRX_STARTTX != 0 {
            self.run_tx();
        }
    }

    fn suspend(&mut self) {
        self.suspended = true;
        self.set(TwimEvent::Suspended);
    }

    fn stop(&mut self) {
        self.bus.stop();
        self.suspended = false;
        self.latched = None;
        self.in_flight = None;
        self.set(TwimEvent::Stopped);
    }
}

/// Shared handle to a simulated TWIM instance.
#[derive(Clone)]
pub struct TwimSim {
    state: Rc<RefCell<TwimState>>,
}

impl TwimSim {
    pub fn new(bus: SimBus) -> Self {
        Self::with_base(bus, TWIM0_BASE)
    }

    pub fn with_base(bus: SimBus, base: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(TwimState {
                bus,
                base,
                enabled: false,
                pins: None,
                frequency: 0,
                address: 0,
                tx: (std::ptr::null(), 0),
                rx: (std::ptr::null_mut(), 0),
                events: 0,
                shorts: 0,
                inten: 0,
                errorsrc: 0,
                txd_amount: 0,
                rxd_amount: 0,
                suspended: false,
                latched: None,
                tasks: Vec::new(),
                stall_txstarted: false,
                slow: false,
                in_flight: None,
                poll_hook: None,
            })),
        }
    }

    /// An enabled event is latched.
    pub fn irq_pending(&self) -> bool {
        let state = self.state.borrow();
        state.events & state.inten != 0
    }

    pub fn is_set(&self, event: TwimEvent) -> bool {
        self.state.borrow().events & event.int_mask() != 0
    }

    /// Latches `event` as if the hardware had generated it.
    pub fn latch(&self, event: TwimEvent) {
        self.state.borrow_mut().set(event);
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

    pub fn pins(&self) -> Option<(u32, u32)> {
        self.state.borrow().pins
    }

    pub fn frequency(&self) -> u32 {
        self.state.borrow().frequency
    }

    pub fn is_suspended(&self) -> bool {
        self.state.borrow().suspended
    }

    /// Every task triggered so far.
    pub fn tasks(&self) -> Vec<TwimTask> {
        self.state.borrow().tasks.clone()
    }

    /// Never raise TXSTARTED.
    pub fn stall_txstarted(&self, stall: bool) {
        self.state.borrow_mut().stall_txstarted = stall;
    }

    /// Leaves started legs in flight until [`TwimSim::finish_leg`].
    pub fn set_slow_bus(&self, slow: bool) {
        self.state.borrow_mut().slow = slow;
    }

    /// A start task has been accepted but its leg has not run yet.
    pub fn leg_in_flight(&self) -> bool {
        self.state.borrow().in_flight.is_some()
    }

    /// Runs the leg left in flight, from the transmit buffer that was
    /// programmed when it started.
    pub fn finish_leg(&self) {
        let mut state = self.state.borrow_mut();
        if let Some((task, tx)) = state.in_flight.take() {
            let current = std::mem::replace(&mut state.tx, tx);
            state.run(task);
            state.tx = current;
        }
    }

    /// Runs `hook` at the start of every event check, outside any borrow of
    /// the model.
    pub fn set_poll_hook(&self, hook: impl FnMut() + 'static) {
        self.state.borrow_mut().poll_hook = Some(Box::new(hook));
    }

    pub fn clear_poll_hook(&self) {
        self.state.borrow_mut().poll_hook = None;
    }

    /// Triggers the task whose register lives at `address`, as an
    /// interconnect channel would.
    pub fn trigger_at(&self, address: u32) {
        let base = self.state.borrow().base;
        let task = match address.wrapping_sub(base) {
            0x000 => TwimTask::StartRx,
            0x008 => TwimTask::StartTx,
            0x014 => TwimTask::Stop,
            0x01C => TwimTask::Suspend,
            0x020 => TwimTask::Resume,
            _ => return,
        };
        self.trigger(task);
    }
}

impl TwimRegisters for TwimSim {
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

    fn set_tx_buffer(&self, buffer: &[u8]) {
        self.state.borrow_mut().tx = (buffer.as_ptr(), buffer.len());
    }

    fn set_rx_buffer(&self, buffer: &mut [u8]) {
        self.state.borrow_mut().rx = (buffer.as_mut_ptr(), buffer.len());
    }

    fn trigger(&self, task: TwimTask) {
        let mut state = self.state.borrow_mut();
        state.tasks.push(task);
        match task {
            TwimTask::StartTx | TwimTask::StartRx if state.suspended => state.latched = Some(task),
            TwimTask::StartTx | TwimTask::StartRx if state.slow => {
                match task {
                    TwimTask::StartTx if !state.stall_txstarted => state.set(TwimEvent::TxStarted),
                    TwimTask::StartRx => state.set(TwimEvent::RxStarted),
                    _ => {}
                }
                let tx = state.tx;
                state.in_flight = Some((task, tx));
            }
            TwimTask::StartTx | TwimTask::StartRx => state.run(task),
            TwimTask::Resume => {
                state.suspended = false;
                if let Some(latched) = state.latched.take() {
                    state.run(latched);
                }
            }
            TwimTask::Suspend => state.suspend(),
            TwimTask::Stop => state.stop(),
        }
    }

    fn event_check(&self, event: TwimEvent) -> bool {
        let hook = self.state.borrow_mut().poll_hook.take();
        if let Some(mut hook) = hook {
            hook();
            let mut state = self.state.borrow_mut();
            if state.poll_hook.is_none() {
                state.poll_hook = Some(hook);
            }
        }
        self.is_set(event)
    }

    fn event_clear(&self, event: TwimEvent) {
        self.state.borrow_mut().events &= !event.int_mask();
    }

    fn shorts_set(&self, mask: u32) {
        self.state.borrow_mut().shorts = mask;
    }

    fn shorts_enable(&self, mask: u32) {
        self.state.borrow_mut().shorts |= mask;
    }

    fn shorts_disable(&self, mask: u32) {
        self.state.borrow_mut().shorts &= !mask;
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

    fn txd_amount(&self) -> u16 {
        self.state.borrow().txd_amount
    }

    fn rxd_amount(&self) -> u16 {
        self.state.borrow().rxd_amount
    }
}
