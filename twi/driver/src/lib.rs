#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! # TWI Driver
//!
//! Master-mode two-wire (I2C) driver for peripherals that come in two
//! flavours: an EasyDMA `TWIM` that streams whole buffers and sequences the
//! bus through hardware shortcuts, and a legacy `TWI` that moves one byte per
//! event.
//!
//! The driver accepts write, read, write-then-read and write-then-write
//! transfers. Completion is reported either by blocking until the bus stops
//! (no handler registered) or through an [`EventHandler`] called from
//! [`Twi::on_interrupt`]. While a transfer is in flight one more may be
//! queued as a linked transfer; it starts as soon as the current one ends.
//!
//! ```ignore
//! let twi = Twi::new(DmaEngine::new(twim0, RamRegion::NRF52), scl, sda, delay, NoInterrupt);
//! twi.initialize(None, None)?;
//! twi.enable()?;
//! twi.write(0x50, &[0x00, 0x10], false)?;
//! ```

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod control;
mod dispatch;
pub mod engine;
pub mod recovery;
pub mod twi;

pub use control::{ControlBlock, ControlCell, LINKED_DEPTH};
pub use engine::{ByteEngine, ByteProgress, Completion, DmaEngine, DmaProgress, Service, TransferEngine};
pub use recovery::{recover, RecoveryOutcome};
pub use twi::Twi;

pub use twi_core::{
    Buffer, DescriptorSnapshot, DriverState, EventHandler, EventKind, Frequency, TransferDescriptor, TransferEvent,
    TransferKind, TwiConfig, TwiConfigBuilder, TwiError, TwiResult, XferFlags,
};
pub use twi_hal as hal;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
