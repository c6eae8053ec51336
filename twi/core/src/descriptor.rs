//! Transfer descriptors
//!
//! A [`TransferDescriptor`] describes one logical bus operation. It borrows the
//! caller's buffers for `'d`; the driver keeps it from admission until the
//! completion is reported, so the buffers cannot be touched while the
//! peripheral may still be reading or writing them.

use crate::{TwiError, TwiResult};

/// Shape of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Write the primary buffer.
    Tx,
    /// Read into the primary buffer.
    Rx,
    /// Write the primary buffer, repeated START, read into the secondary.
    TxRx,
    /// Write the primary then the secondary buffer without releasing the bus.
    TxTx,
}

impl TransferKind {
    /// Kinds that carry a secondary buffer.
    pub const fn has_secondary(self) -> bool {
        matches!(self, TransferKind::TxRx | TransferKind::TxTx)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TransferKind {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TransferKind::Tx => defmt::write!(fmt, "Tx"),
            TransferKind::Rx => defmt::write!(fmt, "Rx"),
            TransferKind::TxRx => defmt::write!(fmt, "TxRx"),
            TransferKind::TxTx => defmt::write!(fmt, "TxTx"),
        }
    }
}

/// One direction of a transfer.
#[derive(Debug)]
pub enum Buffer<'d> {
    /// Bytes to send.
    Tx(&'d [u8]),
    /// Storage for received bytes.
    Rx(&'d mut [u8]),
}

impl<'d> Buffer<'d> {
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_rx(&self) -> bool {
        matches!(self, Buffer::Rx(_))
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Tx(data) => data,
            Buffer::Rx(data) => data,
        }
    }

    /// Receive storage, `None` for transmit buffers.
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            Buffer::Tx(_) => None,
            Buffer::Rx(data) => Some(data),
        }
    }

    fn len_u16(&self) -> u16 {
        u16::try_from(self.len()).unwrap_or(u16::MAX)
    }
}

/// Description of a single transfer.
#[derive(Debug)]
pub struct TransferDescriptor<'d> {
    address: u8,
    kind: TransferKind,
    primary: Buffer<'d>,
    secondary: Option<Buffer<'d>>,
}

impl<'d> TransferDescriptor<'d> {
    /// Write `data` to the device at `address`.
    pub fn tx(address: u8, data: &'d [u8]) -> Self {
        Self {
            address,
            kind: TransferKind::Tx,
            primary: Buffer::Tx(data),
            secondary: None,
        }
    }

    /// Read `buffer.len()` bytes from the device at `address`.
    pub fn rx(address: u8, buffer: &'d mut [u8]) -> Self {
        Self {
            address,
            kind: TransferKind::Rx,
            primary: Buffer::Rx(buffer),
            secondary: None,
        }
    }

    /// Write `data`, then read into `buffer` after a repeated START.
    pub fn txrx(address: u8, data: &'d [u8], buffer: &'d mut [u8]) -> Self {
        Self {
            address,
            kind: TransferKind::TxRx,
            primary: Buffer::Tx(data),
            secondary: Some(Buffer::Rx(buffer)),
        }
    }

    /// Write `first` and `second` back to back in one bus transaction.
    pub fn txtx(address: u8, first: &'d [u8], second: &'d [u8]) -> Self {
        Self {
            address,
            kind: TransferKind::TxTx,
            primary: Buffer::Tx(first),
            secondary: Some(Buffer::Tx(second)),
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn kind(&self) -> TransferKind {
        self.kind
    }

    pub fn primary(&self) -> &Buffer<'d> {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut Buffer<'d> {
        &mut self.primary
    }

    pub fn secondary(&self) -> Option<&Buffer<'d>> {
        self.secondary.as_ref()
    }

    pub fn secondary_mut(&mut self) -> Option<&mut Buffer<'d>> {
        self.secondary.as_mut()
    }

    pub fn primary_len(&self) -> u16 {
        self.primary.len_u16()
    }

    /// Length of the secondary buffer, zero when absent.
    pub fn secondary_len(&self) -> u16 {
        self.secondary.as_ref().map_or(0, Buffer::len_u16)
    }

    /// Checks lengths and the buffer layout against the kind.
    pub fn validate(&self) -> TwiResult<()> {
        let fits = |buffer: &Buffer<'_>| !buffer.is_empty() && buffer.len() <= usize::from(u16::MAX);

        if !fits(&self.primary) {
            return Err(TwiError::InvalidParameter);
        }

        match (&self.secondary, self.kind.has_secondary()) {
            (Some(secondary), true) if fits(secondary) => {}
            (None, false) => {}
            _ => return Err(TwiError::InvalidParameter),
        }

        let layout_ok = match self.kind {
            TransferKind::Tx | TransferKind::TxTx => !self.primary.is_rx(),
            TransferKind::Rx => self.primary.is_rx(),
            TransferKind::TxRx => {
                !self.primary.is_rx() && self.secondary.as_ref().is_some_and(Buffer::is_rx)
            }
        };
        if layout_ok {
            Ok(())
        } else {
            Err(TwiError::InvalidParameter)
        }
    }

    /// View of the descriptor truncated to the bytes actually moved.
    pub fn snapshot(&self, primary_len: u16, secondary_len: u16) -> DescriptorSnapshot<'_> {
        let primary = self.primary.as_slice();
        let secondary = self.secondary.as_ref().map_or(&[][..], Buffer::as_slice);
        DescriptorSnapshot {
            address: self.address,
            kind: self.kind,
            primary: &primary[..usize::from(primary_len).min(primary.len())],
            secondary: &secondary[..usize::from(secondary_len).min(secondary.len())],
        }
    }
}

/// Read-only view of a finished transfer handed to the completion handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorSnapshot<'a> {
    pub address: u8,
    pub kind: TransferKind,
    /// Primary buffer, truncated to the bytes transferred.
    pub primary: &'a [u8],
    /// Secondary buffer, truncated to the bytes transferred; empty when absent.
    pub secondary: &'a [u8],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_primary_is_rejected() {
        let desc = TransferDescriptor::tx(0x50, &[]);
        assert_eq!(desc.validate(), Err(TwiError::InvalidParameter));
    }

    #[test]
    fn empty_secondary_is_rejected() {
        let mut rx: [u8; 0] = [];
        let desc = TransferDescriptor::txrx(0x50, &[1], &mut rx);
        assert_eq!(desc.validate(), Err(TwiError::InvalidParameter));
    }

    #[test]
    fn snapshot_is_truncated() {
        let mut rx = [9u8; 4];
        let desc = TransferDescriptor::txrx(0x50, &[1, 2], &mut rx);
        assert!(desc.validate().is_ok());

        let snap = desc.snapshot(2, 3);
        assert_eq!(snap.primary, &[1, 2]);
        assert_eq!(snap.secondary, &[9, 9, 9]);

        let snap = desc.snapshot(40, 40);
        assert_eq!(snap.primary.len(), 2);
        assert_eq!(snap.secondary.len(), 4);
    }

    #[test]
    fn secondary_len_is_zero_without_secondary() {
        let desc = TransferDescriptor::tx(0x50, &[1, 2, 3]);
        assert_eq!(desc.primary_len(), 3);
        assert_eq!(desc.secondary_len(), 0);
    }
}
