//! EasyDMA engine
//!
//! The peripheral sequences START, address, data and STOP on its own once
//! the buffers and shortcuts are programmed. Software only intervenes at
//! leg boundaries that no shortcut combination covers (write-then-write,
//! write without STOP) and on errors.

use twi_core::{EventKind, Frequency, TransferDescriptor, TransferKind, TwiError, TwiResult, XferFlags};
use twi_hal::twim::{int, shorts};
use twi_hal::{DmaRegion, TwimEvent, TwimRegisters, TwimTask};

use super::{classify, Completion, Service, TransferEngine};
use crate::control::{ControlBlock, ControlCell};

/// Iterations to wait for TXSTARTED before swapping the TxTx buffer.
pub const TXSTARTED_SPIN_LIMIT: u32 = 10_000;

/// DMA engine bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaProgress {
    /// Terminal event of the synchronous loop.
    pub wait_for: TwimEvent,
    /// TxTx: the secondary buffer is on the wire.
    pub second_leg: bool,
}

impl Default for DmaProgress {
    fn default() -> Self {
        Self {
            wait_for: TwimEvent::Stopped,
            second_leg: false,
        }
    }
}

/// Engine for the EasyDMA `TWIM` peripheral.
pub struct DmaEngine<R, M> {
    regs: R,
    region: M,
}

impl<R: TwimRegisters, M: DmaRegion> DmaEngine<R, M> {
    pub fn new(regs: R, region: M) -> Self {
        Self { regs, region }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    /// Bytes on the wire, bounded by the requested lengths.
    fn transferred(&self, desc: &TransferDescriptor<'_>, second_leg: bool) -> (u16, u16) {
        let txd = self.regs.txd_amount();
        let rxd = self.regs.rxd_amount();
        let primary = desc.primary_len();
        let secondary = desc.secondary_len();

        match desc.kind() {
            TransferKind::Tx => (txd.min(primary), 0),
            TransferKind::Rx => (rxd.min(primary), 0),
            TransferKind::TxRx => {
                let sent = txd.min(primary);
                let received = if sent < primary { 0 } else { rxd.min(secondary) };
                (sent, received)
            }
            TransferKind::TxTx if second_leg => (primary, txd.min(secondary)),
            TransferKind::TxTx => (txd.min(primary), 0),
        }
    }

    /// Stops interrupt activity and shortcuts after the final leg.
    fn teardown(&self, cb: &mut ControlBlock<'_, DmaProgress>) {
        self.regs.shorts_set(0);
        cb.interrupt_mask = 0;
        self.regs.int_disable(int::ALL);
    }

    /// Re-arms interrupts for the next leg.
    fn rearm(&self, cb: &mut ControlBlock<'_, DmaProgress>, mask: u32) {
        cb.interrupt_mask = mask;
        self.regs.int_disable(int::ALL);
        self.regs.int_enable(mask);
    }
}

impl<R: TwimRegisters, M: DmaRegion> TransferEngine for DmaEngine<R, M> {
    type Progress = DmaProgress;
    type Task = TwimTask;
    type Event = TwimEvent;

    const ALL_INTERRUPTS: u32 = int::ALL;

    fn check(&self, descriptor: &TransferDescriptor<'_>, flags: XferFlags, has_handler: bool) -> TwiResult<()> {
        let reachable = self.region.is_reachable(descriptor.primary().as_slice())
            && descriptor
                .secondary()
                .map_or(true, |buffer| self.region.is_reachable(buffer.as_slice()));
        if !reachable {
            return Err(TwiError::InvalidAddress);
        }

        // Both need the interrupt path to finish the transfer.
        if !has_handler && (descriptor.kind() == TransferKind::TxTx || flags.contains(XferFlags::HOLD)) {
            return Err(TwiError::NotSupported);
        }
        Ok(())
    }

    fn configure(&self, scl: u32, sda: u32, frequency: Frequency) {
        self.regs.set_pins(scl, sda);
        self.regs.set_frequency(frequency.register_value());
    }

    fn enable(&self) {
        self.regs.enable();
    }

    fn disable(&self) {
        self.regs.int_disable(int::ALL);
        self.regs.shorts_disable(shorts::ALL);
        self.regs.disable();
    }

    fn int_enable(&self, mask: u32) {
        self.regs.int_enable(mask);
    }

    fn int_disable(&self, mask: u32) {
        self.regs.int_disable(mask);
    }

    fn start(&self, cb: &mut ControlBlock<'_, DmaProgress>, desc: &mut TransferDescriptor<'_>) -> TwiResult<()> {
        let flags = cb.flags;
        let has_handler = cb.handler.is_some();
        let regs = &self.regs;
        let kind = desc.kind();

        cb.progress = DmaProgress::default();
        regs.set_address(desc.address());
        regs.event_clear(TwimEvent::Stopped);
        regs.event_clear(TwimEvent::Error);

        let mut start_task = TwimTask::StartTx;
        let mut mask = int::STOPPED | int::ERROR;

        match kind {
            TransferKind::TxTx => {
                regs.shorts_set(shorts::LASTTX_SUSPEND);
                regs.set_tx_buffer(desc.primary().as_slice());
                regs.event_clear(TwimEvent::TxStarted);
                regs.event_clear(TwimEvent::LastTx);
                // A latch left by an earlier held write would end the first leg early.
                regs.event_clear(TwimEvent::Suspended);
                regs.trigger(TwimTask::Resume);
                regs.trigger(TwimTask::StartTx);

                // The pointer is double-buffered once the leg has started;
                // the window is too short to hand back to the caller.
                let mut spins = 0;
                while !regs.event_check(TwimEvent::TxStarted) {
                    spins += 1;
                    if spins >= TXSTARTED_SPIN_LIMIT {
                        error!("twim: TXSTARTED not seen, stopping");
                        regs.shorts_set(0);
                        regs.trigger(TwimTask::Stop);
                        return Err(TwiError::InternalError);
                    }
                }
                regs.event_clear(TwimEvent::TxStarted);
                if let Some(second) = desc.secondary() {
                    regs.set_tx_buffer(second.as_slice());
                }
                mask = int::SUSPENDED | int::ERROR;
            }
            TransferKind::TxRx => {
                regs.set_tx_buffer(desc.primary().as_slice());
                if let Some(buffer) = desc.secondary_mut().and_then(|b| b.as_mut_slice()) {
                    regs.set_rx_buffer(buffer);
                }
                regs.shorts_set(shorts::LASTTX_STARTRX | shorts::LASTRX_STOP);
            }
            TransferKind::Tx => {
                regs.set_tx_buffer(desc.primary().as_slice());
                if flags.contains(XferFlags::NO_STOP) {
                    regs.shorts_set(shorts::LASTTX_SUSPEND);
                    mask = int::LASTTX | int::ERROR;
                    regs.event_clear(TwimEvent::LastTx);
                    cb.progress.wait_for = TwimEvent::LastTx;
                } else {
                    regs.shorts_set(shorts::LASTTX_STOP);
                }
                regs.trigger(TwimTask::Resume);
            }
            TransferKind::Rx => {
                if let Some(buffer) = desc.primary_mut().as_mut_slice() {
                    regs.set_rx_buffer(buffer);
                }
                regs.shorts_set(shorts::LASTRX_STOP);
                start_task = TwimTask::StartRx;
                regs.trigger(TwimTask::Resume);
            }
        }

        if !flags.contains(XferFlags::HOLD) && kind != TransferKind::TxTx {
            regs.trigger(start_task);
        }

        if has_handler && flags.contains(XferFlags::NO_COMPLETION_SIGNAL) {
            mask = int::ERROR;
        }
        cb.interrupt_mask = mask;
        trace!("twim: started {:?} to {}", kind, desc.address());
        Ok(())
    }

    fn poll(&self, control: &ControlCell<'_, DmaProgress>, _desc: &mut TransferDescriptor<'_>) -> nb::Result<(), TwiError> {
        let wait_for = control.with(|cb| cb.progress.wait_for);

        if self.regs.event_check(wait_for) {
            let source = self.regs.errorsrc_get_and_clear();
            return classify(source).into_result().map_err(nb::Error::Other);
        }

        if self.regs.event_check(TwimEvent::Error) {
            self.regs.event_clear(TwimEvent::Error);
            self.regs.trigger(TwimTask::Stop);
            control.with(|cb| cb.progress.wait_for = TwimEvent::Stopped);
            debug!("twim: error latched, forcing stop");
        }

        Err(nb::Error::WouldBlock)
    }

    fn service(&self, cb: &mut ControlBlock<'_, DmaProgress>) -> Service {
        let regs = &self.regs;

        if regs.event_check(TwimEvent::Error) {
            regs.event_clear(TwimEvent::Error);
            if !regs.event_check(TwimEvent::Stopped) {
                regs.int_disable(cb.interrupt_mask);
                cb.interrupt_mask = int::STOPPED;
                regs.int_enable(cb.interrupt_mask);

                regs.trigger(TwimTask::Resume);
                regs.trigger(TwimTask::Stop);
                debug!("twim: error latched, waiting for stop");
                return Service::Pending;
            }
        }

        let Some(desc) = cb.active.as_ref() else {
            return Service::Pending;
        };
        let kind = desc.kind();

        let (primary_len, secondary_len) = if regs.event_check(TwimEvent::Stopped) {
            regs.event_clear(TwimEvent::Stopped);
            let lengths = self.transferred(desc, cb.progress.second_leg);

            // LASTTX/LASTRX are cleared before the repeated check so a
            // repeated transfer restarts from clean latches.
            regs.event_clear(TwimEvent::LastTx);
            regs.event_clear(TwimEvent::LastRx);
            if !cb.repeated {
                self.teardown(cb);
            }
            lengths
        } else {
            let suspended = regs.event_check(TwimEvent::Suspended);
            if !suspended && !regs.event_check(TwimEvent::LastTx) {
                return Service::Pending;
            }
            regs.event_clear(TwimEvent::Suspended);
            regs.event_clear(TwimEvent::LastTx);

            match kind {
                TransferKind::Tx => {
                    let lengths = self.transferred(desc, false);
                    self.teardown(cb);
                    lengths
                }
                TransferKind::TxTx if !cb.progress.second_leg => {
                    regs.shorts_set(shorts::LASTTX_STOP);
                    self.rearm(cb, int::STOPPED | int::ERROR);
                    regs.trigger(TwimTask::StartTx);
                    regs.trigger(TwimTask::Resume);
                    cb.progress.second_leg = true;
                    return Service::Pending;
                }
                TransferKind::TxRx if suspended => {
                    regs.shorts_set(shorts::LASTRX_STOP);
                    self.rearm(cb, int::STOPPED | int::ERROR);
                    regs.trigger(TwimTask::StartRx);
                    regs.trigger(TwimTask::Resume);
                    return Service::Pending;
                }
                _ => return Service::Pending,
            }
        };

        let kind = classify(regs.errorsrc_get_and_clear());
        if kind != EventKind::Done {
            debug!("twim: transfer failed: {:?}", kind);
        }
        Service::Complete(Completion {
            kind,
            primary_len,
            secondary_len,
        })
    }

    fn bytes_transferred(&self, _progress: &DmaProgress) -> TwiResult<u16> {
        Err(TwiError::NotSupported)
    }

    fn task_address(&self, task: TwimTask) -> u32 {
        self.regs.task_address(task)
    }

    fn event_address(&self, event: TwimEvent) -> u32 {
        self.regs.event_address(event)
    }
}
