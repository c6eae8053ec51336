//! Byte-wise engine for the legacy `TWI` peripheral
//!
//! Every byte is fed or drained by software on TXDSENT/RXDREADY. The
//! byte-boundary shortcuts stand in for the DMA shortcut chain: BB_SUSPEND
//! holds the bus after each received byte, and BB_STOP makes the hardware
//! NACK the final byte and issue STOP.
//!
//! The same [`ByteEngine::advance`] step drives both the synchronous poll
//! loop and the interrupt handler.

use twi_core::{Buffer, EventKind, Frequency, TransferDescriptor, TwiError, TwiResult, XferFlags};
use twi_hal::twi::{int, shorts};
use twi_hal::{TwiEvent, TwiRegisters, TwiTask};

use super::{classify, Completion, Service, TransferEngine};
use crate::control::{ControlBlock, ControlCell};

const TRANSFER_INTERRUPTS: u32 = int::STOPPED | int::ERROR | int::TXDSENT | int::RXDREADY;

/// Which buffer of the descriptor is on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Primary,
    Secondary,
}

/// Byte engine bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteProgress {
    /// Bytes acknowledged in the current phase.
    pub bytes: u16,
    /// Bytes moved by the primary phase once it is finished.
    pub primary_done: u16,
    pub phase: Phase,
    /// An error was latched and STOP requested.
    pub error: bool,
}

impl ByteProgress {
    fn lengths(&self) -> (u16, u16) {
        match self.phase {
            Phase::Primary => (self.bytes, 0),
            Phase::Secondary => (self.primary_done, self.bytes),
        }
    }
}

fn phase_buffer<'a, 'd>(desc: &'a mut TransferDescriptor<'d>, phase: Phase) -> Option<&'a mut Buffer<'d>> {
    match phase {
        Phase::Primary => Some(desc.primary_mut()),
        Phase::Secondary => desc.secondary_mut(),
    }
}

fn phase_len(desc: &TransferDescriptor<'_>, phase: Phase) -> u16 {
    match phase {
        Phase::Primary => desc.primary_len(),
        Phase::Secondary => desc.secondary_len(),
    }
}

fn to_error(kind: EventKind) -> TwiError {
    kind.into_result().err().unwrap_or(TwiError::InternalError)
}

/// Engine for the legacy `TWI` peripheral.
pub struct ByteEngine<R> {
    regs: R,
}

impl<R: TwiRegisters> ByteEngine<R> {
    pub fn new(regs: R) -> Self {
        Self { regs }
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }

    fn stop_on_error(&self, progress: &mut ByteProgress) {
        self.regs.event_clear(TwiEvent::Error);
        self.regs.trigger(TwiTask::Stop);
        progress.error = true;
        debug!("twi: error latched after {} bytes, forcing stop", progress.bytes);
    }

    fn begin_phase(&self, buffer: &Buffer<'_>) {
        match buffer {
            Buffer::Tx(data) => {
                self.regs.trigger(TwiTask::StartTx);
                if let Some(&first) = data.first() {
                    self.regs.txd_set(first);
                }
            }
            Buffer::Rx(data) => {
                let short = if data.len() == 1 { shorts::BB_STOP } else { shorts::BB_SUSPEND };
                self.regs.shorts_set(short);
                self.regs.trigger(TwiTask::StartRx);
            }
        }
    }

    /// Feeds the next outgoing byte. Returns `false` when the transfer ends
    /// with the bus held.
    fn send_byte(&self, desc: &mut TransferDescriptor<'_>, progress: &mut ByteProgress, flags: XferFlags) -> bool {
        if let Some(buffer) = phase_buffer(desc, progress.phase) {
            if let Some(&byte) = buffer.as_slice().get(usize::from(progress.bytes)) {
                self.regs.txd_set(byte);
                return true;
            }
        }

        if progress.phase == Phase::Primary {
            if let Some(next) = desc.secondary() {
                progress.primary_done = progress.bytes;
                progress.bytes = 0;
                progress.phase = Phase::Secondary;
                match next {
                    // Same direction: keep streaming, no restart.
                    Buffer::Tx(data) => {
                        if let Some(&first) = data.first() {
                            self.regs.txd_set(first);
                        }
                    }
                    Buffer::Rx(_) => self.begin_phase(next),
                }
                return true;
            }
        }

        if flags.contains(XferFlags::NO_STOP) {
            self.regs.trigger(TwiTask::Suspend);
            return false;
        }
        self.regs.trigger(TwiTask::Stop);
        true
    }

    fn receive_byte(&self, desc: &mut TransferDescriptor<'_>, progress: &mut ByteProgress) {
        let Some(buffer) = phase_buffer(desc, progress.phase).and_then(|b| b.as_mut_slice()) else {
            return;
        };
        let index = usize::from(progress.bytes);
        if index >= buffer.len() {
            return;
        }

        buffer[index] = self.regs.rxd_get();
        progress.bytes += 1;

        let received = usize::from(progress.bytes);
        if received + 1 == buffer.len() {
            self.regs.shorts_set(shorts::BB_STOP);
        } else if received == buffer.len() {
            return;
        }
        self.regs.trigger(TwiTask::Resume);
    }

    /// Advances the transfer by at most one byte.
    pub fn advance(
        &self,
        desc: &mut TransferDescriptor<'_>,
        progress: &mut ByteProgress,
        flags: XferFlags,
    ) -> nb::Result<(), EventKind> {
        let regs = &self.regs;
        let finishing = progress.error || progress.bytes == phase_len(desc, progress.phase);

        if progress.error {
            regs.event_clear(TwiEvent::Error);
            regs.event_clear(TwiEvent::TxdSent);
            regs.event_clear(TwiEvent::RxdReady);
        } else if regs.event_check(TwiEvent::Error) {
            self.stop_on_error(progress);
        } else if regs.event_check(TwiEvent::TxdSent) {
            regs.event_clear(TwiEvent::TxdSent);
            if regs.event_check(TwiEvent::Error) {
                self.stop_on_error(progress);
            } else {
                progress.bytes += 1;
                if !self.send_byte(desc, progress, flags) {
                    return Ok(());
                }
            }
        } else if regs.event_check(TwiEvent::RxdReady) {
            regs.event_clear(TwiEvent::RxdReady);
            if regs.event_check(TwiEvent::Error) {
                self.stop_on_error(progress);
            } else {
                self.receive_byte(desc, progress);
            }
        }

        if finishing && regs.event_check(TwiEvent::Stopped) {
            regs.event_clear(TwiEvent::Stopped);
            if progress.error {
                let kind = match classify(regs.errorsrc_get_and_clear()) {
                    EventKind::Done => EventKind::InternalError,
                    kind => kind,
                };
                return Err(nb::Error::Other(kind));
            }
            return Ok(());
        }

        Err(nb::Error::WouldBlock)
    }
}

impl<R: TwiRegisters> TransferEngine for ByteEngine<R> {
    type Progress = ByteProgress;
    type Task = TwiTask;
    type Event = TwiEvent;

    const ALL_INTERRUPTS: u32 = int::ALL;

    fn check(&self, _descriptor: &TransferDescriptor<'_>, flags: XferFlags, _has_handler: bool) -> TwiResult<()> {
        // No shortcut chain to leave armed or to hold.
        if flags.intersects(XferFlags::REPEATED | XferFlags::HOLD) {
            return Err(TwiError::NotSupported);
        }
        // Software feeds every byte, so the instance has to stay busy until
        // STOP; an unsignalled transfer would be overrun by the next request.
        if flags.contains(XferFlags::NO_COMPLETION_SIGNAL) {
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
        self.regs.shorts_set(0);
        self.regs.disable();
    }

    fn int_enable(&self, mask: u32) {
        self.regs.int_enable(mask);
    }

    fn int_disable(&self, mask: u32) {
        self.regs.int_disable(mask);
    }

    fn start(&self, cb: &mut ControlBlock<'_, ByteProgress>, desc: &mut TransferDescriptor<'_>) -> TwiResult<()> {
        let regs = &self.regs;

        regs.event_clear(TwiEvent::Stopped);
        regs.event_clear(TwiEvent::Error);
        regs.event_clear(TwiEvent::TxdSent);
        regs.event_clear(TwiEvent::RxdReady);
        regs.errorsrc_get_and_clear();
        regs.shorts_set(0);

        cb.progress = ByteProgress::default();
        regs.set_address(desc.address());
        regs.trigger(TwiTask::Resume);
        self.begin_phase(desc.primary());

        cb.interrupt_mask = TRANSFER_INTERRUPTS;
        trace!("twi: started {:?} to {}", desc.kind(), desc.address());
        Ok(())
    }

    fn poll(&self, control: &ControlCell<'_, ByteProgress>, desc: &mut TransferDescriptor<'_>) -> nb::Result<(), TwiError> {
        control.with(|cb| {
            let flags = cb.flags;
            self.advance(desc, &mut cb.progress, flags).map_err(|err| err.map(to_error))
        })
    }

    fn service(&self, cb: &mut ControlBlock<'_, ByteProgress>) -> Service {
        let flags = cb.flags;
        let Some(desc) = cb.active.as_mut() else {
            return Service::Pending;
        };

        let kind = match self.advance(desc, &mut cb.progress, flags) {
            Err(nb::Error::WouldBlock) => return Service::Pending,
            Err(nb::Error::Other(kind)) => kind,
            Ok(()) => EventKind::Done,
        };

        self.regs.shorts_set(0);
        cb.interrupt_mask = 0;
        self.regs.int_disable(int::ALL);

        let (primary_len, secondary_len) = cb.progress.lengths();
        Service::Complete(Completion {
            kind,
            primary_len,
            secondary_len,
        })
    }

    fn bytes_transferred(&self, progress: &ByteProgress) -> TwiResult<u16> {
        Ok(progress.primary_done.saturating_add(progress.bytes))
    }

    fn task_address(&self, task: TwiTask) -> u32 {
        self.regs.task_address(task)
    }

    fn event_address(&self, event: TwiEvent) -> u32 {
        self.regs.event_address(event)
    }
}
