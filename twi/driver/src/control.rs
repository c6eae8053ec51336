//! Per-instance control block
//!
//! The control block is the only state shared between the foreground
//! (admission) and the interrupt handler. It lives in a
//! `critical_section::Mutex` and is only ever borrowed inside
//! `critical_section::with`.

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;
use twi_core::{DriverState, EventHandler, TransferDescriptor, TransferKind, TwiError, TwiResult, XferFlags};

/// Depth of the linked-transfer slot.
pub const LINKED_DEPTH: usize = 1;

/// A transfer waiting for the active one to finish.
pub type LinkedTransfer<'d> = (TransferDescriptor<'d>, XferFlags);

/// Mutable driver state for one peripheral instance.
///
/// `P` is the engine-specific progress record.
pub struct ControlBlock<'d, P> {
    pub(crate) state: DriverState,
    pub(crate) busy: bool,
    pub(crate) repeated: bool,
    pub(crate) flags: XferFlags,
    pub(crate) active: Option<TransferDescriptor<'d>>,
    pub(crate) linked: Deque<LinkedTransfer<'d>, LINKED_DEPTH>,
    pub(crate) interrupt_mask: u32,
    pub(crate) handler: Option<&'d dyn EventHandler>,
    pub(crate) progress: P,
}

impl<'d, P: Default> ControlBlock<'d, P> {
    pub fn new() -> Self {
        Self {
            state: DriverState::Uninitialized,
            busy: false,
            repeated: false,
            flags: XferFlags::NONE,
            active: None,
            linked: Deque::new(),
            interrupt_mask: 0,
            handler: None,
            progress: P::default(),
        }
    }

    /// Drops every trace of the current and linked transfers.
    pub(crate) fn reset(&mut self) {
        self.busy = false;
        self.repeated = false;
        self.flags = XferFlags::NONE;
        self.active = None;
        self.linked.clear();
        self.interrupt_mask = 0;
        self.progress = P::default();
    }
}

impl<'d, P: Default> Default for ControlBlock<'d, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, P> ControlBlock<'d, P> {
    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn flags(&self) -> XferFlags {
        self.flags
    }

    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }

    pub fn interrupt_mask(&self) -> u32 {
        self.interrupt_mask
    }

    pub fn active(&self) -> Option<&TransferDescriptor<'d>> {
        self.active.as_ref()
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    /// Takes the idle block for a transfer that will be started now.
    ///
    /// The descriptor is stored by the caller once the hardware is armed.
    pub(crate) fn claim(&mut self, flags: XferFlags) {
        self.busy = !flags.contains(XferFlags::NO_COMPLETION_SIGNAL);
        self.repeated = flags.contains(XferFlags::REPEATED);
        self.flags = flags;
        self.active = None;
    }

    /// Claims the block for a caller that spins on completion and keeps
    /// the descriptor on its own stack.
    pub(crate) fn claim_blocking(&mut self, flags: XferFlags) -> TwiResult<()> {
        if self.busy {
            return Err(TwiError::Busy);
        }
        self.claim(flags);
        self.busy = true;
        Ok(())
    }

    /// Parks a request behind the active transfer.
    ///
    /// Must run with the instance interrupts masked.
    pub(crate) fn link(&mut self, descriptor: TransferDescriptor<'d>, flags: XferFlags) -> TwiResult<()> {
        if self.handler.is_none() || descriptor.kind() == TransferKind::TxTx {
            return Err(TwiError::Busy);
        }
        self.linked
            .push_back((descriptor, flags))
            .map_err(|_| TwiError::Busy)
    }

    /// Undoes a claim whose hardware programming failed.
    pub(crate) fn abort_start(&mut self) {
        self.busy = false;
        self.repeated = false;
        self.active = None;
        self.interrupt_mask = 0;
    }
}

/// Interrupt-safe cell around a [`ControlBlock`].
pub struct ControlCell<'d, P> {
    inner: Mutex<RefCell<ControlBlock<'d, P>>>,
}

impl<'d, P: Default> ControlCell<'d, P> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(ControlBlock::new())),
        }
    }
}

impl<'d, P: Default> Default for ControlCell<'d, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, P> ControlCell<'d, P> {
    /// Runs `f` on the control block inside a critical section.
    ///
    /// `f` must not call back into the driver.
    pub fn with<R>(&self, f: impl FnOnce(&mut ControlBlock<'d, P>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }
}
