//! Legacy byte-wise two-wire master (`TWI`) register access

/// Tasks of the legacy TWI peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TwiTask {
    StartRx = 0x000,
    StartTx = 0x008,
    Stop = 0x014,
    Suspend = 0x01C,
    Resume = 0x020,
}

/// Events of the legacy TWI peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TwiEvent {
    Stopped = 0x104,
    RxdReady = 0x108,
    TxdSent = 0x11C,
    Error = 0x124,
    ByteBoundary = 0x138,
    Suspended = 0x148,
}

impl TwiTask {
    pub const fn offset(self) -> u32 {
        self as u32
    }
}

impl TwiEvent {
    pub const fn offset(self) -> u32 {
        self as u32
    }

    /// INTEN bit for this event.
    pub const fn int_mask(self) -> u32 {
        1 << ((self as u32 - 0x100) / 4)
    }
}

/// INTEN masks.
pub mod int {
    use super::TwiEvent;

    pub const STOPPED: u32 = TwiEvent::Stopped.int_mask();
    pub const RXDREADY: u32 = TwiEvent::RxdReady.int_mask();
    pub const TXDSENT: u32 = TwiEvent::TxdSent.int_mask();
    pub const ERROR: u32 = TwiEvent::Error.int_mask();
    pub const BB: u32 = TwiEvent::ByteBoundary.int_mask();
    pub const SUSPENDED: u32 = TwiEvent::Suspended.int_mask();

    pub const ALL: u32 = STOPPED | RXDREADY | TXDSENT | ERROR | BB | SUSPENDED;
}

/// SHORTS masks.
pub mod shorts {
    /// Byte boundary suspends the peripheral.
    pub const BB_SUSPEND: u32 = 1 << 0;
    /// Byte boundary issues STOP.
    pub const BB_STOP: u32 = 1 << 1;

    pub const ALL: u32 = BB_SUSPEND | BB_STOP;
}

/// Register-level access to one legacy TWI instance.
pub trait TwiRegisters {
    /// Peripheral base address.
    fn base_address(&self) -> u32;

    fn enable(&self);
    fn disable(&self);

    fn set_pins(&self, scl: u32, sda: u32);
    /// Writes the raw FREQUENCY register value.
    fn set_frequency(&self, frequency: u32);
    fn set_address(&self, address: u8);

    /// Writes TXD, sending one byte.
    fn txd_set(&self, byte: u8);
    /// Reads RXD.
    fn rxd_get(&self) -> u8;

    fn trigger(&self, task: TwiTask);
    fn event_check(&self, event: TwiEvent) -> bool;
    fn event_clear(&self, event: TwiEvent);

    fn shorts_set(&self, mask: u32);

    fn int_enable(&self, mask: u32);
    fn int_disable(&self, mask: u32);

    /// Reads ERRORSRC and clears the latched bits.
    fn errorsrc_get_and_clear(&self) -> u32;

    fn task_address(&self, task: TwiTask) -> u32 {
        self.base_address() + task.offset()
    }

    fn event_address(&self, event: TwiEvent) -> u32 {
        self.base_address() + event.offset()
    }
}
