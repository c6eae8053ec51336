//! Transfer flags accepted by `transfer()`

use core::ops::{BitOr, BitOrAssign};

/// Bit set of per-transfer options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XferFlags(u32);

impl XferFlags {
    /// No options.
    pub const NONE: Self = Self(0);
    /// Post-increment the transmit buffer pointer. Unsupported.
    pub const TX_POSTINC: Self = Self(1 << 0);
    /// Post-increment the receive buffer pointer. Unsupported.
    pub const RX_POSTINC: Self = Self(1 << 1);
    /// Skip busy and callback bookkeeping for this transfer.
    pub const NO_COMPLETION_SIGNAL: Self = Self(1 << 2);
    /// Keep shortcuts and interrupts armed after completion.
    pub const REPEATED: Self = Self(1 << 3);
    /// Program the transfer but do not trigger the start task.
    pub const HOLD: Self = Self(1 << 4);
    /// Do not issue a STOP condition after the last byte.
    pub const NO_STOP: Self = Self(1 << 5);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// True when every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// True when any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for XferFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for XferFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for XferFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "XferFlags({=u32:#x})", self.0)
    }
}
