#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

//! # TWI Core
//!
//! Core types shared by the TWI/TWIM master driver: transfer descriptors,
//! transfer flags, completion events, driver state and configuration.
//! Nothing in this crate touches hardware.

use core::fmt;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

pub mod config;
pub mod descriptor;
pub mod event;
pub mod flags;
pub mod state;

pub use config::*;
pub use descriptor::*;
pub use event::*;
pub use flags::*;
pub use state::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used throughout the driver
pub type TwiResult<T> = Result<T, TwiError>;

/// Error types for driver operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TwiError {
    /// Operation not allowed in the current driver state
    InvalidState,
    /// A transfer is in flight and the request could not be queued
    Busy,
    /// Buffer is not reachable by the DMA engine
    InvalidAddress,
    /// Malformed transfer descriptor
    InvalidParameter,
    /// Flag combination not supported by this backend
    NotSupported,
    /// No device acknowledged the address
    AddressNack,
    /// Device rejected a data byte
    DataNack,
    /// Unclassified hardware error
    InternalError,
}

impl fmt::Display for TwiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TwiError::InvalidState => write!(f, "Invalid driver state"),
            TwiError::Busy => write!(f, "Driver is busy"),
            TwiError::InvalidAddress => write!(f, "Buffer not reachable by DMA"),
            TwiError::InvalidParameter => write!(f, "Invalid transfer parameter"),
            TwiError::NotSupported => write!(f, "Operation not supported"),
            TwiError::AddressNack => write!(f, "Address not acknowledged"),
            TwiError::DataNack => write!(f, "Data not acknowledged"),
            TwiError::InternalError => write!(f, "Internal bus error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TwiError {}

#[cfg(feature = "defmt")]
impl defmt::Format for TwiError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            TwiError::InvalidState => defmt::write!(fmt, "InvalidState"),
            TwiError::Busy => defmt::write!(fmt, "Busy"),
            TwiError::InvalidAddress => defmt::write!(fmt, "InvalidAddress"),
            TwiError::InvalidParameter => defmt::write!(fmt, "InvalidParameter"),
            TwiError::NotSupported => defmt::write!(fmt, "NotSupported"),
            TwiError::AddressNack => defmt::write!(fmt, "AddressNack"),
            TwiError::DataNack => defmt::write!(fmt, "DataNack"),
            TwiError::InternalError => defmt::write!(fmt, "InternalError"),
        }
    }
}

impl embedded_hal::i2c::Error for TwiError {
    fn kind(&self) -> ErrorKind {
        match self {
            TwiError::AddressNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            TwiError::DataNack => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::Error as _;

    #[test]
    fn nack_errors_map_to_embedded_hal_kinds() {
        assert_eq!(
            TwiError::AddressNack.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
        );
        assert_eq!(
            TwiError::DataNack.kind(),
            ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
        );
        assert_eq!(TwiError::Busy.kind(), ErrorKind::Other);
    }
}
