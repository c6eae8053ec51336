//! Completion events and handlers

use crate::{DescriptorSnapshot, TwiError};

/// Outcome of a finished transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Transfer completed.
    Done,
    /// No device acknowledged the address.
    AddressNack,
    /// Device rejected a data byte.
    DataNack,
    /// Error latched that is neither an address nor a data NACK.
    InternalError,
}

impl EventKind {
    pub fn is_done(self) -> bool {
        self == EventKind::Done
    }

    /// Converts the outcome into a result.
    pub fn into_result(self) -> Result<(), TwiError> {
        match self {
            EventKind::Done => Ok(()),
            EventKind::AddressNack => Err(TwiError::AddressNack),
            EventKind::DataNack => Err(TwiError::DataNack),
            EventKind::InternalError => Err(TwiError::InternalError),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for EventKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            EventKind::Done => defmt::write!(fmt, "Done"),
            EventKind::AddressNack => defmt::write!(fmt, "AddressNack"),
            EventKind::DataNack => defmt::write!(fmt, "DataNack"),
            EventKind::InternalError => defmt::write!(fmt, "InternalError"),
        }
    }
}

/// Event record delivered to the completion handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferEvent<'a> {
    pub kind: EventKind,
    pub descriptor: DescriptorSnapshot<'a>,
}

/// Completion handler, invoked from interrupt context.
///
/// Implementations must not block. Any state the handler needs is carried
/// by the implementor itself.
pub trait EventHandler: Sync {
    fn on_event(&self, event: &TransferEvent<'_>);
}

impl<F> EventHandler for F
where
    F: Fn(&TransferEvent<'_>) + Sync,
{
    fn on_event(&self, event: &TransferEvent<'_>) {
        self(event)
    }
}
