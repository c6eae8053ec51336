//! Host-side models for exercising the TWI driver
//!
//! Both peripheral models sit on a shared [`SimBus`] that records every
//! electrical condition (START, address, data, ACK/NACK, STOP) and answers
//! with scripted [`Device`]s. Models are cheap clone handles: hand one clone
//! to the driver and keep another for inspection.

pub mod bus;
pub mod lines;
pub mod twi;
pub mod twim;

pub use bus::{BusCondition, Device, SimBus};
pub use lines::{sim_lines, LineProbe, PinEvent, SimDelay, SimIrq, SimPin, Wire};
pub use twi::{TwiSim, TWI0_BASE};
pub use twim::{TwimSim, TWIM0_BASE};
