//! Bus recovery
//!
//! A slave that was interrupted mid-byte (reset of the master, brown-out)
//! may keep SDA low forever waiting for clocks. Clocking SCL until SDA is
//! released, then issuing a STOP, returns the bus to idle.

use embedded_hal::delay::DelayNs;
use twi_hal::{GpioPin, PinMode};

/// Upper bound on SCL pulses; one byte plus the acknowledge bit.
pub const RECOVERY_PULSES: u32 = 9;

/// Half-period of the recovery clock, in microseconds.
pub const RECOVERY_DELAY_US: u32 = 4;

/// What the recovery procedure observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// SDA was high on the first check; nothing was driven.
    Idle,
    /// SDA was released after `pulses` SCL pulses; a STOP was issued.
    Released { pulses: u32 },
    /// SDA stayed low for every pulse; a STOP was forced anyway.
    Stuck,
}

#[cfg(feature = "defmt")]
impl defmt::Format for RecoveryOutcome {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            RecoveryOutcome::Idle => defmt::write!(fmt, "Idle"),
            RecoveryOutcome::Released { pulses } => defmt::write!(fmt, "Released({=u32})", pulses),
            RecoveryOutcome::Stuck => defmt::write!(fmt, "Stuck"),
        }
    }
}

/// Releases a stuck bus.
///
/// Best effort: terminates after at most [`RECOVERY_PULSES`] clock pulses
/// whatever the bus does. The returned outcome is informational only.
pub fn recover<P, D>(scl: &mut P, sda: &mut P, delay: &mut D) -> RecoveryOutcome
where
    P: GpioPin,
    D: DelayNs,
{
    scl.set_mode(PinMode::InputPullUp);
    sda.set_mode(PinMode::InputPullUp);

    scl.set_high();
    sda.set_high();

    scl.set_mode(PinMode::OutputOpenDrain);
    sda.set_mode(PinMode::OutputOpenDrain);

    delay.delay_us(RECOVERY_DELAY_US);

    let mut outcome = RecoveryOutcome::Stuck;
    for pulse in 0..RECOVERY_PULSES {
        if sda.read().is_high() {
            if pulse == 0 {
                trace!("twi: bus idle, no recovery needed");
                return RecoveryOutcome::Idle;
            }
            outcome = RecoveryOutcome::Released { pulses: pulse };
            break;
        }
        scl.set_low();
        delay.delay_us(RECOVERY_DELAY_US);
        scl.set_high();
        delay.delay_us(RECOVERY_DELAY_US);
    }

    // STOP: SDA rising while SCL is high.
    sda.set_low();
    delay.delay_us(RECOVERY_DELAY_US);
    sda.set_high();

    match outcome {
        RecoveryOutcome::Stuck => warn!("twi: SDA still low after {} pulses, forced stop", RECOVERY_PULSES),
        _ => info!("twi: bus released by recovery"),
    }
    outcome
}
