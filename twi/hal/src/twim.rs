//! EasyDMA two-wire master (`TWIM`) register access
//!
//! Task and event identifiers are the register offsets from the peripheral
//! base, so their addresses can be handed to an interconnect for hardware
//! triggering. Interrupt enable bits follow the event offsets.

/// Tasks of the TWIM peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TwimTask {
    StartRx = 0x000,
    StartTx = 0x008,
    Stop = 0x014,
    Suspend = 0x01C,
    Resume = 0x020,
}

/// Events of the TWIM peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TwimEvent {
    Stopped = 0x104,
    Error = 0x124,
    Suspended = 0x148,
    RxStarted = 0x14C,
    TxStarted = 0x150,
    LastRx = 0x15C,
    LastTx = 0x160,
}

impl TwimTask {
    pub const fn offset(self) -> u32 {
        self as u32
    }
}

impl TwimEvent {
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
    use super::TwimEvent;

    pub const STOPPED: u32 = TwimEvent::Stopped.int_mask();
    pub const ERROR: u32 = TwimEvent::Error.int_mask();
    pub const SUSPENDED: u32 = TwimEvent::Suspended.int_mask();
    pub const RXSTARTED: u32 = TwimEvent::RxStarted.int_mask();
    pub const TXSTARTED: u32 = TwimEvent::TxStarted.int_mask();
    pub const LASTRX: u32 = TwimEvent::LastRx.int_mask();
    pub const LASTTX: u32 = TwimEvent::LastTx.int_mask();

    pub const ALL: u32 = STOPPED | ERROR | SUSPENDED | RXSTARTED | TXSTARTED | LASTRX | LASTTX;
}

/// SHORTS masks.
pub mod shorts {
    pub const LASTTX_STARTRX: u32 = 1 << 7;
    pub const LASTTX_SUSPEND: u32 = 1 << 8;
    pub const LASTTX_STOP: u32 = 1 << 9;
    pub const LASTRX_STARTTX: u32 = 1 << 10;
    pub const LASTRX_STOP: u32 = 1 << 12;

    pub const ALL: u32 = LASTTX_STARTRX | LASTTX_SUSPEND | LASTTX_STOP | LASTRX_STARTTX | LASTRX_STOP;
}

/// Register-level access to one TWIM instance.
pub trait TwimRegisters {
    /// Peripheral base address.
    fn base_address(&self) -> u32;

    fn enable(&self);
    fn disable(&self);

    fn set_pins(&self, scl: u32, sda: u32);
    /// Writes the raw FREQUENCY register value.
    fn set_frequency(&self, frequency: u32);
    fn set_address(&self, address: u8);

    /// Latches the transmit buffer pointer and length.
    fn set_tx_buffer(&self, buffer: &[u8]);
    /// Latches the receive buffer pointer and length.
    fn set_rx_buffer(&self, buffer: &mut [u8]);

    fn trigger(&self, task: TwimTask);
    fn event_check(&self, event: TwimEvent) -> bool;
    fn event_clear(&self, event: TwimEvent);

    fn shorts_set(&self, mask: u32);
    fn shorts_enable(&self, mask: u32);
    fn shorts_disable(&self, mask: u32);

    fn int_enable(&self, mask: u32);
    fn int_disable(&self, mask: u32);

    /// Reads ERRORSRC and clears the latched bits.
    fn errorsrc_get_and_clear(&self) -> u32;

    /// Bytes moved by the last transmit leg.
    fn txd_amount(&self) -> u16;
    /// Bytes moved by the last receive leg.
    fn rxd_amount(&self) -> u16;

    fn task_address(&self, task: TwimTask) -> u32 {
        self.base_address() + task.offset()
    }

    fn event_address(&self, event: TwimEvent) -> u32 {
        self.base_address() + event.offset()
    }
}
