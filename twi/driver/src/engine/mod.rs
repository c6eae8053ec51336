//! Transfer engines
//!
//! A [`TransferEngine`] owns the register programming for one peripheral
//! variant. The driver picks the engine through a type parameter, so the
//! variant is fixed when the instance is constructed.

use twi_core::{EventKind, Frequency, TransferDescriptor, TwiError, TwiResult, XferFlags};
use twi_hal::errorsrc;

use crate::control::{ControlBlock, ControlCell};

pub mod byte;
pub mod dma;

pub use byte::{ByteEngine, ByteProgress};
pub use dma::{DmaEngine, DmaProgress, TXSTARTED_SPIN_LIMIT};

/// Byte counts of a finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub kind: EventKind,
    pub primary_len: u16,
    pub secondary_len: u16,
}

/// Result of one interrupt service step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Transfer still running; wait for the next interrupt.
    Pending,
    /// Transfer finished; hardware is stopped or held as requested.
    Complete(Completion),
}

/// One hardware backend.
pub trait TransferEngine {
    /// Engine bookkeeping kept in the control block.
    type Progress: Default;
    /// Task identifiers exposed for hardware triggering.
    type Task: Copy;
    /// Event identifiers exposed for hardware triggering.
    type Event: Copy;

    /// Mask covering every interrupt source of the peripheral.
    const ALL_INTERRUPTS: u32;

    /// Backend-specific admission checks. Runs before any hardware access.
    fn check(&self, descriptor: &TransferDescriptor<'_>, flags: XferFlags, has_handler: bool) -> TwiResult<()>;

    fn configure(&self, scl: u32, sda: u32, frequency: Frequency);
    fn enable(&self);
    /// Clears interrupts and shortcuts, then disables the peripheral.
    fn disable(&self);

    fn int_enable(&self, mask: u32);
    fn int_disable(&self, mask: u32);

    /// Programs `desc` and starts it.
    ///
    /// `desc` is borrowed only for the call; the caller keeps it alive and
    /// untouched until the transfer completes. On return `cb.interrupt_mask`
    /// holds the sources to enable when a handler is registered.
    fn start(&self, cb: &mut ControlBlock<'_, Self::Progress>, desc: &mut TransferDescriptor<'_>) -> TwiResult<()>;

    /// One step of the synchronous completion loop for `desc`.
    fn poll(
        &self,
        control: &ControlCell<'_, Self::Progress>,
        desc: &mut TransferDescriptor<'_>,
    ) -> nb::Result<(), TwiError>;

    /// One step of the interrupt-driven completion protocol.
    fn service(&self, cb: &mut ControlBlock<'_, Self::Progress>) -> Service;

    /// Bytes moved by the current or last transfer.
    fn bytes_transferred(&self, progress: &Self::Progress) -> TwiResult<u16>;

    fn task_address(&self, task: Self::Task) -> u32;
    fn event_address(&self, event: Self::Event) -> u32;
}

/// Decodes a latched ERRORSRC value.
pub fn classify(source: u32) -> EventKind {
    if source & errorsrc::ANACK != 0 {
        EventKind::AddressNack
    } else if source & errorsrc::DNACK != 0 {
        EventKind::DataNack
    } else if source != 0 {
        EventKind::InternalError
    } else {
        EventKind::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prefers_address_nack() {
        assert_eq!(classify(0), EventKind::Done);
        assert_eq!(classify(errorsrc::ANACK), EventKind::AddressNack);
        assert_eq!(classify(errorsrc::ANACK | errorsrc::DNACK), EventKind::AddressNack);
        assert_eq!(classify(errorsrc::DNACK), EventKind::DataNack);
        assert_eq!(classify(errorsrc::OVERRUN), EventKind::InternalError);
    }
}
