//! Simulated SCL/SDA lines, delay and interrupt line

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use twi_hal::{GpioPin, InterruptLine, InterruptPriority, Level, PinMode};

/// Which wire a [`PinEvent`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wire {
    Scl,
    Sda,
}

/// Activity recorded on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinEvent {
    Mode(Wire, PinMode),
    Drive(Wire, Level),
}

#[derive(Debug)]
struct LineState {
    scl_pin: u32,
    sda_pin: u32,
    scl: Level,
    sda: Level,
    /// Rising SCL edges during which a slave keeps SDA low.
    stuck_for: u32,
    scl_pulses: u32,
    events: Vec<PinEvent>,
}

/// Inspection handle shared by both lines.
#[derive(Debug, Clone)]
pub struct LineProbe {
    state: Rc<RefCell<LineState>>,
}

impl LineProbe {
    /// Rising edges driven on SCL.
    pub fn scl_pulses(&self) -> u32 {
        self.state.borrow().scl_pulses
    }

    /// Times the master drove SDA low.
    pub fn sda_low_drives(&self) -> usize {
        self.state
            .borrow()
            .events
            .iter()
            .filter(|event| **event == PinEvent::Drive(Wire::Sda, Level::Low))
            .count()
    }

    pub fn events(&self) -> Vec<PinEvent> {
        self.state.borrow().events.clone()
    }

    /// Last mode applied to `wire`.
    pub fn mode(&self, wire: Wire) -> Option<PinMode> {
        self.state.borrow().events.iter().rev().find_map(|event| match event {
            PinEvent::Mode(w, mode) if *w == wire => Some(*mode),
            _ => None,
        })
    }

    pub fn clear(&self) {
        self.state.borrow_mut().events.clear();
    }
}

/// One simulated bus line.
#[derive(Debug, Clone)]
pub struct SimPin {
    wire: Wire,
    state: Rc<RefCell<LineState>>,
}

/// Creates an SCL/SDA pair. A slave holds SDA low until `stuck_for`
/// clock pulses have been seen.
pub fn sim_lines(scl_pin: u32, sda_pin: u32, stuck_for: u32) -> (SimPin, SimPin, LineProbe) {
    let state = Rc::new(RefCell::new(LineState {
        scl_pin,
        sda_pin,
        scl: Level::High,
        sda: Level::High,
        stuck_for,
        scl_pulses: 0,
        events: Vec::new(),
    }));
    (
        SimPin {
            wire: Wire::Scl,
            state: state.clone(),
        },
        SimPin {
            wire: Wire::Sda,
            state: state.clone(),
        },
        LineProbe { state },
    )
}

impl GpioPin for SimPin {
    fn set_mode(&mut self, mode: PinMode) {
        self.state.borrow_mut().events.push(PinEvent::Mode(self.wire, mode));
    }

    fn read(&self) -> Level {
        let state = self.state.borrow();
        match self.wire {
            Wire::Scl => state.scl,
            Wire::Sda if state.sda == Level::Low || state.stuck_for > 0 => Level::Low,
            Wire::Sda => Level::High,
        }
    }

    fn write(&mut self, level: Level) {
        let mut state = self.state.borrow_mut();
        state.events.push(PinEvent::Drive(self.wire, level));
        match self.wire {
            Wire::Scl => {
                if state.scl == Level::Low && level == Level::High {
                    state.scl_pulses += 1;
                    state.stuck_for = state.stuck_for.saturating_sub(1);
                }
                state.scl = level;
            }
            Wire::Sda => state.sda = level,
        }
    }

    fn pin_number(&self) -> u32 {
        let state = self.state.borrow();
        match self.wire {
            Wire::Scl => state.scl_pin,
            Wire::Sda => state.sda_pin,
        }
    }
}

/// Delay that returns at once and accumulates the requested time.
#[derive(Debug, Clone, Default)]
pub struct SimDelay {
    total_ns: Rc<Cell<u64>>,
}

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ns(&self) -> u64 {
        self.total_ns.get()
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
    }
}

#[derive(Debug, Default)]
struct IrqState {
    enabled: bool,
    priority: Option<InterruptPriority>,
    enables: u32,
    disables: u32,
}

/// Interrupt line that records enable/disable calls.
#[derive(Debug, Clone, Default)]
pub struct SimIrq {
    state: Rc<RefCell<IrqState>>,
}

impl SimIrq {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.state.borrow().enabled
    }

    pub fn priority(&self) -> Option<InterruptPriority> {
        self.state.borrow().priority
    }

    pub fn enables(&self) -> u32 {
        self.state.borrow().enables
    }

    pub fn disables(&self) -> u32 {
        self.state.borrow().disables
    }
}

impl InterruptLine for SimIrq {
    fn enable(&mut self, priority: InterruptPriority) {
        let mut state = self.state.borrow_mut();
        state.enabled = true;
        state.priority = Some(priority);
        state.enables += 1;
    }

    fn disable(&mut self) {
        let mut state = self.state.borrow_mut();
        state.enabled = false;
        state.disables += 1;
    }
}
