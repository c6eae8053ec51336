//! Hardware collaborators for the TWI master driver
//!
//! Vendor-agnostic traits for everything the driver consumes but does not
//! own: GPIO lines used by bus recovery, the instance interrupt line, the
//! DMA reachability check, and register-level access to the two peripheral
//! variants (EasyDMA `TWIM` and legacy byte-wise `TWI`).

#![cfg_attr(not(feature = "std"), no_std)]

pub mod dma;
pub mod gpio;
pub mod interrupt;
pub mod twi;
pub mod twim;

// Re-export commonly used types
pub use dma::{DmaRegion, RamRegion};
pub use gpio::{GpioPin, Level, PinMode};
pub use interrupt::{InterruptLine, InterruptPriority};
pub use twi::{TwiEvent, TwiRegisters, TwiTask};
pub use twim::{TwimEvent, TwimRegisters, TwimTask};

/// ERRORSRC register bits, common to both peripheral variants.
pub mod errorsrc {
    /// Receive overrun (legacy TWI) / RXD buffer overrun.
    pub const OVERRUN: u32 = 1 << 0;
    /// NACK received after sending the address.
    pub const ANACK: u32 = 1 << 1;
    /// NACK received after sending a data byte.
    pub const DNACK: u32 = 1 << 2;
}
