//! Driver instance
//!
//! [`Twi`] ties one [`TransferEngine`] to its control block and the
//! collaborators used outside transfers (bus pins, delay, interrupt line).
//! All methods take `&self` so an instance can be shared between the
//! application and its interrupt handler.

use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::delay::DelayNs;
use twi_core::{
    DriverState, EventHandler, TransferDescriptor, TransferKind, TwiConfig, TwiError, TwiResult, XferFlags,
};
use twi_hal::{GpioPin, InterruptLine, PinMode};

use crate::control::{ControlBlock, ControlCell};
use crate::engine::TransferEngine;
use crate::recovery::recover;

/// Collaborators only touched during lifecycle transitions.
pub(crate) struct Bus<P, D, I> {
    pub(crate) scl: P,
    pub(crate) sda: P,
    pub(crate) delay: D,
    pub(crate) irq: I,
    pub(crate) config: TwiConfig,
}

/// A TWI master instance.
///
/// `'d` bounds the handler and the buffers of transfers completed from the
/// interrupt handler. Blocking transfers borrow their buffers only for the
/// call.
pub struct Twi<'d, E: TransferEngine, P, D, I> {
    pub(crate) engine: E,
    pub(crate) control: ControlCell<'d, E::Progress>,
    pub(crate) bus: Mutex<RefCell<Bus<P, D, I>>>,
}

/// Masks the instance interrupts; restores the control block's mask on
/// drop when a handler is registered.
pub(crate) struct InterruptMask<'a, 'd, E: TransferEngine> {
    engine: &'a E,
    control: &'a ControlCell<'d, E::Progress>,
    restore: bool,
}

impl<'a, 'd, E: TransferEngine> InterruptMask<'a, 'd, E> {
    pub(crate) fn new(engine: &'a E, control: &'a ControlCell<'d, E::Progress>, restore: bool) -> Self {
        engine.int_disable(E::ALL_INTERRUPTS);
        Self {
            engine,
            control,
            restore,
        }
    }
}

impl<E: TransferEngine> Drop for InterruptMask<'_, '_, E> {
    fn drop(&mut self) {
        if self.restore {
            let mask = self.control.with(|cb| cb.interrupt_mask);
            self.engine.int_enable(mask);
        }
    }
}

/// Flag rules that hold for every backend.
fn check_flags(descriptor: &TransferDescriptor<'_>, flags: XferFlags) -> TwiResult<()> {
    let kind = descriptor.kind();
    if flags.contains(XferFlags::NO_STOP) && kind != TransferKind::Tx {
        return Err(TwiError::NotSupported);
    }
    if kind == TransferKind::TxTx
        && flags.intersects(XferFlags::HOLD | XferFlags::REPEATED | XferFlags::NO_COMPLETION_SIGNAL)
    {
        return Err(TwiError::NotSupported);
    }
    Ok(())
}

impl<'d, E, P, D, I> Twi<'d, E, P, D, I>
where
    E: TransferEngine,
    P: GpioPin,
    D: DelayNs,
    I: InterruptLine,
{
    /// Creates an uninitialized instance.
    pub fn new(engine: E, scl: P, sda: P, delay: D, irq: I) -> Self {
        Self {
            engine,
            control: ControlCell::new(),
            bus: Mutex::new(RefCell::new(Bus {
                scl,
                sda,
                delay,
                irq,
                config: TwiConfig::default(),
            })),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Recovers the bus and configures the peripheral.
    ///
    /// Without a handler every transfer completes synchronously.
    pub fn initialize(&self, config: Option<TwiConfig>, handler: Option<&'d dyn EventHandler>) -> TwiResult<()> {
        let config = config.unwrap_or_default();

        self.control.with(|cb| {
            if cb.state != DriverState::Uninitialized {
                return Err(TwiError::InvalidState);
            }
            cb.reset();
            cb.handler = handler;
            Ok(())
        })?;

        critical_section::with(|cs| {
            let mut bus = self.bus.borrow_ref_mut(cs);
            let bus = &mut *bus;

            if config.clear_bus_init {
                let outcome = recover(&mut bus.scl, &mut bus.sda, &mut bus.delay);
                debug!("twi: recovery outcome {:?}", outcome);
            }

            // Keep valid levels on the lines while the peripheral is off.
            bus.scl.set_mode(PinMode::InputPullUp);
            bus.sda.set_mode(PinMode::InputPullUp);

            self.engine
                .configure(bus.scl.pin_number(), bus.sda.pin_number(), config.frequency);

            if handler.is_some() {
                bus.irq.enable(config.interrupt_priority);
            }
            bus.config = config;
        });

        self.control.with(|cb| cb.state = DriverState::Initialized);
        info!("twi: initialized, handler: {}", handler.is_some());
        Ok(())
    }

    /// Returns the instance to `Uninitialized`, disabling it first.
    pub fn uninitialize(&self) -> TwiResult<()> {
        let has_handler = self.control.with(|cb| {
            if cb.state == DriverState::Uninitialized {
                return Err(TwiError::InvalidState);
            }
            Ok(cb.handler.is_some())
        })?;

        critical_section::with(|cs| {
            let mut bus = self.bus.borrow_ref_mut(cs);
            if has_handler {
                bus.irq.disable();
            }
            self.shut_down();
            if !bus.config.hold_bus_uninit {
                bus.scl.set_mode(PinMode::Disconnected);
                bus.sda.set_mode(PinMode::Disconnected);
            }
        });

        self.control.with(|cb| {
            cb.state = DriverState::Uninitialized;
            cb.handler = None;
        });
        info!("twi: uninitialized");
        Ok(())
    }

    /// `Initialized -> Enabled`.
    pub fn enable(&self) -> TwiResult<()> {
        self.control.with(|cb| {
            if cb.state != DriverState::Initialized {
                return Err(TwiError::InvalidState);
            }
            self.engine.enable();
            cb.state = DriverState::Enabled;
            Ok(())
        })
    }

    /// `Enabled -> Initialized`. Abandons any transfer in flight.
    pub fn disable(&self) -> TwiResult<()> {
        if self.state() != DriverState::Enabled {
            return Err(TwiError::InvalidState);
        }
        self.shut_down();
        Ok(())
    }

    fn shut_down(&self) {
        self.control.with(|cb| {
            self.engine.disable();
            cb.reset();
            if cb.state == DriverState::Enabled {
                cb.state = DriverState::Initialized;
            }
        });
    }

    pub fn state(&self) -> DriverState {
        self.control.with(|cb| cb.state)
    }

    /// True while a transfer that expects a completion is in flight.
    pub fn is_busy(&self) -> bool {
        self.control.with(|cb| cb.busy)
    }

    /// Starts, links or rejects a transfer.
    ///
    /// Without a handler this is [`Twi::transfer_blocking`]. With a handler
    /// it returns once the hardware is armed, or once the request is parked
    /// behind the active transfer, and the outcome is delivered to the
    /// handler from [`Twi::on_interrupt`].
    pub fn transfer(&self, descriptor: TransferDescriptor<'d>, flags: XferFlags) -> TwiResult<()> {
        if !self.admissible(&descriptor, flags)? {
            return self.run_blocking(descriptor, flags);
        }

        let result = {
            let _mask = InterruptMask::new(&self.engine, &self.control, true);
            self.control.with(|cb| {
                if cb.busy {
                    cb.link(descriptor, flags)?;
                    debug!("twi: transfer linked");
                    return Ok(());
                }
                self.launch(cb, descriptor, flags).map_err(|(err, _)| err)
            })
        };

        if let Err(err) = result {
            debug!("twi: transfer rejected: {:?}", err);
        }
        result
    }

    /// Runs a transfer to completion on the caller's stack.
    ///
    /// Spins until the bus is stopped (or held for `NO_STOP`); errors
    /// collapse into `InternalError`. Instances with a handler complete
    /// transfers from the interrupt path only and return `NotSupported`.
    pub fn transfer_blocking(&self, descriptor: TransferDescriptor<'_>, flags: XferFlags) -> TwiResult<()> {
        if self.admissible(&descriptor, flags)? {
            return Err(TwiError::NotSupported);
        }
        self.run_blocking(descriptor, flags)
    }

    fn run_blocking(&self, mut descriptor: TransferDescriptor<'_>, flags: XferFlags) -> TwiResult<()> {
        let started = {
            let _mask = InterruptMask::new(&self.engine, &self.control, false);
            self.control.with(|cb| {
                cb.claim_blocking(flags)?;
                self.engine.start(cb, &mut descriptor).map_err(|err| {
                    cb.abort_start();
                    err
                })
            })
        };

        if let Err(err) = started {
            debug!("twi: transfer rejected: {:?}", err);
            return Err(err);
        }
        self.complete_blocking(&mut descriptor)
    }

    /// Writes `data`; with `no_stop` the bus stays held for a follow-up.
    ///
    /// Blocking; see [`Twi::transfer_blocking`].
    pub fn write(&self, address: u8, data: &[u8], no_stop: bool) -> TwiResult<()> {
        let flags = if no_stop { XferFlags::NO_STOP } else { XferFlags::NONE };
        self.transfer_blocking(TransferDescriptor::tx(address, data), flags)
    }

    /// Reads `buffer.len()` bytes. Blocking.
    pub fn read(&self, address: u8, buffer: &mut [u8]) -> TwiResult<()> {
        self.transfer_blocking(TransferDescriptor::rx(address, buffer), XferFlags::NONE)
    }

    /// Checks shared by both paths. Returns whether a handler is registered.
    fn admissible(&self, descriptor: &TransferDescriptor<'_>, flags: XferFlags) -> TwiResult<bool> {
        if flags.intersects(XferFlags::TX_POSTINC | XferFlags::RX_POSTINC) {
            return Err(TwiError::NotSupported);
        }
        descriptor.validate()?;

        let (state, has_handler) = self.control.with(|cb| (cb.state, cb.handler.is_some()));
        if state != DriverState::Enabled {
            return Err(TwiError::InvalidState);
        }
        check_flags(descriptor, flags)?;
        self.engine.check(descriptor, flags, has_handler)?;
        Ok(has_handler)
    }

    /// Claims the idle block and arms the hardware for `descriptor`.
    ///
    /// Must run with the instance interrupts masked. The descriptor is
    /// handed back when the hardware refuses it.
    pub(crate) fn launch(
        &self,
        cb: &mut ControlBlock<'d, E::Progress>,
        mut descriptor: TransferDescriptor<'d>,
        flags: XferFlags,
    ) -> Result<(), (TwiError, TransferDescriptor<'d>)> {
        cb.claim(flags);
        match self.engine.start(cb, &mut descriptor) {
            Ok(()) => {
                cb.active = Some(descriptor);
                Ok(())
            }
            Err(err) => {
                cb.abort_start();
                Err((err, descriptor))
            }
        }
    }

    /// Bytes moved by the current or last transfer. Byte engine only.
    pub fn bytes_transferred(&self) -> TwiResult<u16> {
        self.control.with(|cb| self.engine.bytes_transferred(&cb.progress))
    }

    /// Register address of `task`, for hardware triggering of held transfers.
    pub fn task_address(&self, task: E::Task) -> u32 {
        self.engine.task_address(task)
    }

    /// Register address of `event`.
    pub fn event_address(&self, event: E::Event) -> u32 {
        self.engine.event_address(event)
    }
}
